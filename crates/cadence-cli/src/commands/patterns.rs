//! Pattern listing commands

use std::path::Path;

use anyhow::Result;
use cadence_core::RecurringPattern;
use chrono::{Duration, Utc};

use super::open_db;

pub fn cmd_patterns(db_path: &Path, user: &str, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let patterns = db.list_patterns(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&patterns)?);
        return Ok(());
    }

    if patterns.is_empty() {
        println!(
            "No recurring patterns for {}. Run 'cadence detect --user {}' first.",
            user, user
        );
        return Ok(());
    }

    println!("🔁 Recurring patterns for {}", user);
    for pattern in &patterns {
        print_pattern(pattern);
    }

    Ok(())
}

pub fn cmd_upcoming(db_path: &Path, user: &str, days: i64, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let until = Utc::now() + Duration::days(days);
    let due = db.list_patterns_due_before(user, until)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&due)?);
        return Ok(());
    }

    if due.is_empty() {
        println!("Nothing due in the next {} days for {}.", days, user);
        return Ok(());
    }

    println!("📅 Due within {} days for {}", days, user);
    for pattern in &due {
        print_pattern(pattern);
    }

    let total: f64 = due.iter().map(|p| p.amount.abs()).sum();
    println!();
    println!("   Total upcoming: ${:.2}", total);

    Ok(())
}

fn print_pattern(pattern: &RecurringPattern) {
    println!(
        "   {} ${:.2} {}: next due {}, seen {}x, confidence {:.2}",
        pattern.merchant,
        pattern.amount.abs(),
        pattern.cadence,
        pattern.next_due.format("%Y-%m-%d"),
        pattern.occurrences,
        pattern.confidence
    );
}
