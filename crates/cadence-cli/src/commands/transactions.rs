//! Transaction listing command

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub fn cmd_transactions(db_path: &Path, user: &str, limit: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let transactions = db.list_transactions(user, limit, 0)?;

    if transactions.is_empty() {
        println!("No transactions for {}.", user);
        return Ok(());
    }

    println!("💳 Transactions for {} (latest {})", user, transactions.len());
    for tx in &transactions {
        let label = tx
            .merchant
            .as_deref()
            .or(tx.description.as_deref())
            .unwrap_or("(no label)");
        println!(
            "   [{}] {} {} {:.2}",
            tx.id,
            tx.date.format("%Y-%m-%d"),
            label,
            tx.amount
        );
    }

    Ok(())
}
