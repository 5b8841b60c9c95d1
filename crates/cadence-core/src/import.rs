//! CSV import for transaction feeds
//!
//! Format: `Date,Merchant,Description,Amount`. Merchant may be blank;
//! dates may be RFC3339 timestamps, plain `YYYY-MM-DD` dates, or raw
//! epoch milliseconds. Malformed rows are skipped with a logged warning
//! and never abort the import.

use std::io::Read;

use chrono::{DateTime, NaiveDate, Utc};
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::Result;
use crate::models::NewTransaction;

/// Normalize a feed timestamp to a comparable instant
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    // Raw epoch milliseconds
    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms);
    }

    None
}

/// Generate a unique hash for deduplication
fn generate_hash(user_id: &str, date: &DateTime<Utc>, label: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(date.timestamp_millis().to_be_bytes());
    hasher.update(label.as_bytes());
    hasher.update(amount.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Parse a transaction feed CSV for one user
pub fn parse_csv<R: Read>(reader: R, user_id: &str) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut transactions = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let line = index + 2; // header is line 1

        let date_raw = record.get(0).unwrap_or("");
        let merchant = record.get(1).unwrap_or("").trim();
        let description = record.get(2).unwrap_or("").trim();
        let amount_raw = record.get(3).unwrap_or("").trim();

        let Some(date) = parse_instant(date_raw) else {
            warn!("Skipping line {}: unparseable date '{}'", line, date_raw);
            continue;
        };

        let amount: f64 = match amount_raw.replace(',', "").parse() {
            Ok(a) => a,
            Err(_) => {
                warn!("Skipping line {}: unparseable amount '{}'", line, amount_raw);
                continue;
            }
        };

        if merchant.is_empty() && description.is_empty() {
            warn!("Skipping line {}: no merchant or description", line);
            continue;
        }

        let label = if merchant.is_empty() {
            description
        } else {
            merchant
        };

        transactions.push(NewTransaction {
            user_id: user_id.to_string(),
            merchant: (!merchant.is_empty()).then(|| merchant.to_string()),
            description: (!description.is_empty()).then(|| description.to_string()),
            amount,
            date,
            import_hash: generate_hash(user_id, &date, label, amount),
        });
    }

    Ok(transactions)
}
