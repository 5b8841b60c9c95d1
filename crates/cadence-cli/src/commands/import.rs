//! Import command implementation

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::{parse_csv, PatternDetector};

use super::open_db;

pub fn cmd_import(db_path: &Path, file: &Path, user: &str, no_detect: bool) -> Result<()> {
    println!("📥 Importing {} for {}...", file.display(), user);

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let transactions = parse_csv(csv_file, user)?;

    println!("   Found {} transactions", transactions.len());

    let db = open_db(db_path)?;

    let mut imported = 0;
    let mut skipped = 0;
    for tx in &transactions {
        match db.insert_transaction(tx)? {
            Some(_) => imported += 1,
            None => skipped += 1,
        }
    }

    println!("✅ Import complete!");
    println!("   Imported: {}", imported);
    println!("   Skipped (duplicates): {}", skipped);

    // Refresh patterns from the new data (unless --no-detect)
    if !no_detect && imported > 0 {
        println!();
        println!("🔍 Running pattern detection...");
        let detector = PatternDetector::new(&db);
        let run = detector.run_for_user(user)?;
        println!(
            "   Patterns: {} ({} new, {} refreshed)",
            run.detected, run.inserted, run.updated
        );
    }

    Ok(())
}
