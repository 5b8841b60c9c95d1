//! Recurring pattern store operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{from_millis, parse_datetime, Database};
use crate::error::Result;
use crate::models::{Cadence, DetectedPattern, RecurringPattern};

const PATTERN_COLUMNS: &str = "id, user_id, pattern_key, merchant, amount, cadence, next_due_ms, \
     occurrences, last_occurrence_ms, is_fixed, confidence, created_at, updated_at";

fn row_to_pattern(row: &Row) -> rusqlite::Result<RecurringPattern> {
    let cadence_str: String = row.get(5)?;
    let next_due_ms: i64 = row.get(6)?;
    let last_occurrence_ms: i64 = row.get(8)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(RecurringPattern {
        id: row.get(0)?,
        user_id: row.get(1)?,
        pattern_key: row.get(2)?,
        merchant: row.get(3)?,
        amount: row.get(4)?,
        cadence: cadence_str.parse().unwrap_or(Cadence::Monthly),
        next_due: from_millis(next_due_ms),
        occurrences: row.get(7)?,
        last_occurrence: from_millis(last_occurrence_ms),
        is_fixed: row.get(9)?,
        confidence: row.get(10)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

impl Database {
    /// Look up a pattern by its natural key
    pub fn find_pattern(
        &self,
        user_id: &str,
        pattern_key: &str,
    ) -> Result<Option<RecurringPattern>> {
        let conn = self.conn()?;

        let pattern = conn
            .query_row(
                &format!(
                    "SELECT {} FROM recurring_patterns WHERE user_id = ? AND pattern_key = ?",
                    PATTERN_COLUMNS
                ),
                params![user_id, pattern_key],
                row_to_pattern,
            )
            .optional()?;

        Ok(pattern)
    }

    /// Insert a new pattern row, returning its id
    pub fn insert_pattern(&self, user_id: &str, pattern: &DetectedPattern) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO recurring_patterns
                (user_id, pattern_key, merchant, amount, cadence, next_due_ms,
                 occurrences, last_occurrence_ms, is_fixed, confidence)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, TRUE, ?)
            "#,
            params![
                user_id,
                pattern.pattern_key,
                pattern.merchant,
                pattern.amount,
                pattern.cadence.as_str(),
                pattern.next_due.timestamp_millis(),
                pattern.occurrences,
                pattern.last_occurrence.timestamp_millis(),
                pattern.confidence,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Refresh an existing pattern from a new detection, bumping updated_at
    pub fn patch_pattern(&self, id: i64, pattern: &DetectedPattern) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            UPDATE recurring_patterns
            SET amount = ?,
                cadence = ?,
                next_due_ms = ?,
                occurrences = ?,
                last_occurrence_ms = ?,
                confidence = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                pattern.amount,
                pattern.cadence.as_str(),
                pattern.next_due.timestamp_millis(),
                pattern.occurrences,
                pattern.last_occurrence.timestamp_millis(),
                pattern.confidence,
                id,
            ],
        )?;

        Ok(())
    }

    /// List all of a user's patterns, soonest due first
    pub fn list_patterns(&self, user_id: &str) -> Result<Vec<RecurringPattern>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM recurring_patterns WHERE user_id = ? ORDER BY next_due_ms ASC",
            PATTERN_COLUMNS
        ))?;

        let patterns = stmt
            .query_map(params![user_id], row_to_pattern)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(patterns)
    }

    /// Patterns due on or before `until` (the upcoming-deductions query)
    pub fn list_patterns_due_before(
        &self,
        user_id: &str,
        until: DateTime<Utc>,
    ) -> Result<Vec<RecurringPattern>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM recurring_patterns WHERE user_id = ? AND next_due_ms <= ? ORDER BY next_due_ms ASC",
            PATTERN_COLUMNS
        ))?;

        let patterns = stmt
            .query_map(params![user_id, until.timestamp_millis()], row_to_pattern)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(patterns)
    }
}
