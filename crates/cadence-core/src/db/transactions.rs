//! Transaction operations

use rusqlite::{params, OptionalExtension, Row};

use super::{from_millis, parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewTransaction, Transaction};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, date_ms, merchant, description, amount, import_hash, created_at";

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let date_ms: i64 = row.get(2)?;
    let created_at_str: String = row.get(7)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: from_millis(date_ms),
        merchant: row.get(3)?,
        description: row.get(4)?,
        amount: row.get(5)?,
        import_hash: row.get(6)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Insert a transaction (skips duplicates based on import_hash)
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<Option<i64>> {
        let conn = self.conn()?;

        // Check for duplicate
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM transactions WHERE import_hash = ?",
                params![tx.import_hash],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Ok(None); // Duplicate, skip
        }

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, date_ms, merchant, description, amount, import_hash)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.user_id,
                tx.date.timestamp_millis(),
                tx.merchant,
                tx.description,
                tx.amount,
                tx.import_hash,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// List a user's transactions, newest first
    pub fn list_transactions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? ORDER BY date_ms DESC LIMIT ? OFFSET ?",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id, limit, offset], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Fetch a user's outflow transactions, oldest first
    ///
    /// The `amount < 0` filter mirrors `detect::is_outflow`.
    pub fn list_outflows(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? AND amount < 0 ORDER BY date_ms ASC",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}
