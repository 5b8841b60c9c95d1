//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_detect` - Run recurring pattern detection
//! - `cmd_status` - Show database status

use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::{Database, DetectorConfig, PatternDetector};

/// Open the database, running migrations if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path.to_string_lossy();
    Database::new(&path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: cadence import --file feed.csv --user you");
    println!("  2. Detect patterns: cadence detect --user you");

    Ok(())
}

pub fn cmd_detect(db_path: &Path, user: &str, config_path: Option<&Path>) -> Result<()> {
    println!("🔍 Detecting recurring patterns for {}...", user);

    let db = open_db(db_path)?;

    let config = match config_path {
        Some(path) => DetectorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DetectorConfig::default(),
    };

    let detector = PatternDetector::with_config(&db, config);
    let run = detector.run_for_user(user)?;

    println!();
    println!("📊 Detection Results");
    println!("   ─────────────────────────────");
    println!("   Patterns detected: {}", run.detected);
    println!("   New: {}", run.inserted);
    println!("   Refreshed: {}", run.updated);
    if run.skipped_malformed > 0 {
        println!(
            "   ⚠️  Malformed transactions skipped: {}",
            run.skipped_malformed
        );
    }
    for failure in &run.failures {
        println!(
            "   ⚠️  {} failed to store: {}",
            failure.pattern_key, failure.error
        );
    }

    if run.detected > 0 {
        println!();
        println!(
            "Run 'cadence upcoming --user {}' to see upcoming deductions.",
            user
        );
    }

    Ok(())
}

pub fn cmd_status(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let conn = db.conn()?;

    let transactions: i64 =
        conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    let patterns: i64 = conn.query_row("SELECT COUNT(*) FROM recurring_patterns", [], |row| {
        row.get(0)
    })?;

    println!("📁 Database: {}", db.path());
    println!("   Transactions: {}", transactions);
    println!("   Recurring patterns: {}", patterns);

    Ok(())
}
