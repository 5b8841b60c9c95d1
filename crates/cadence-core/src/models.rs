//! Core data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bank transaction owned by a user
///
/// Negative amounts are outflows (money leaving the account), positive
/// amounts are inflows. Dates are stored as epoch milliseconds so instants
/// from different feeds compare directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    /// Merchant label, when the feed provides one
    pub merchant: Option<String>,
    /// Raw statement description, the grouping fallback
    pub description: Option<String>,
    /// Negative = outflow, positive = inflow
    pub amount: f64,
    pub date: DateTime<Utc>,
    /// Hash for deduplication
    pub import_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A transaction parsed from a feed (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: String,
    pub merchant: Option<String>,
    pub description: Option<String>,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub import_hash: String,
}

/// Repetition cadence of a recurring pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Weekly,
    Biweekly,
    Monthly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("Unknown cadence: {}", s)),
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected recurring charge, unique per (user_id, pattern_key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub id: i64,
    pub user_id: String,
    /// Natural key: grouping label plus the amount rounded to cents
    pub pattern_key: String,
    /// Display label (the grouping label)
    pub merchant: String,
    /// Rounded per-occurrence amount (signed, negative = outflow)
    pub amount: f64,
    pub cadence: Cadence,
    /// Predicted instant of the next occurrence
    pub next_due: DateTime<Utc>,
    /// Count of matched transactions contributing to this pattern
    pub occurrences: i64,
    pub last_occurrence: DateTime<Utc>,
    /// Fixed-amount pattern; always true for detector-created rows
    pub is_fixed: bool,
    /// Regularity score in [0, 1]
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Output of the pure detector for one accepted candidate group
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedPattern {
    pub pattern_key: String,
    pub merchant: String,
    pub amount: f64,
    pub cadence: Cadence,
    pub next_due: DateTime<Utc>,
    pub occurrences: i64,
    pub last_occurrence: DateTime<Utc>,
    pub confidence: f64,
}
