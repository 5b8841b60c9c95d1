//! Recurring transaction pattern detection
//!
//! Groups a user's outflows by merchant and amount, validates that the
//! occurrence intervals are regular, classifies a repetition cadence,
//! predicts the next charge date, and upserts the results into the
//! pattern store.
//!
//! The algorithm itself ([`detect_patterns`]) is a pure function over a
//! transaction slice; [`PatternDetector`] is the thin adapter that wires
//! it to storage.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::{DetectorConfig, DAY_MS};
use crate::db::Database;
use crate::error::Result;
use crate::models::{Cadence, DetectedPattern, Transaction};

/// Outflow sign convention: negative amounts are money leaving the
/// account. Feeds that report spend as positive must flip signs at
/// ingestion; nothing downstream re-interprets the sign.
pub fn is_outflow(amount: f64) -> bool {
    amount < 0.0
}

/// Cadence classification table: the first entry whose bound (in days)
/// covers the mean interval wins, inclusive. Anything past the last
/// bound classifies as monthly.
const CADENCE_TABLE: &[(f64, Cadence)] = &[(7.0, Cadence::Weekly), (14.0, Cadence::Biweekly)];

fn classify_cadence(mean_interval_ms: f64) -> Cadence {
    for &(max_days, cadence) in CADENCE_TABLE {
        if mean_interval_ms <= max_days * DAY_MS {
            return cadence;
        }
    }
    Cadence::Monthly
}

/// Round to cents. The pattern key and the stored amount both go through
/// this, so they can never disagree.
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Grouping label: merchant when the feed provided one, statement
/// description otherwise
fn grouping_label(tx: &Transaction) -> Option<&str> {
    tx.merchant
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| tx.description.as_deref().filter(|s| !s.trim().is_empty()))
}

/// One candidate group while accumulating
struct Bucket {
    merchant: String,
    amount: f64,
    dates: Vec<DateTime<Utc>>,
}

/// Result of the pure detection pass
#[derive(Debug, Default)]
pub struct Detection {
    pub patterns: Vec<DetectedPattern>,
    /// Transactions dropped for missing labels or non-finite amounts
    pub skipped_malformed: usize,
}

/// Detect recurring patterns in a transaction slice
///
/// Pure function, no storage dependency. Inflows are ignored, malformed
/// transactions are skipped with a logged warning, and only groups that
/// reach the occurrence threshold and pass the interval regularity gate
/// are returned.
pub fn detect_patterns(transactions: &[Transaction], config: &DetectorConfig) -> Detection {
    let mut buckets: HashMap<String, Bucket> = HashMap::new();
    let mut skipped_malformed = 0usize;

    for tx in transactions {
        if !tx.amount.is_finite() {
            warn!("Skipping transaction {}: non-finite amount", tx.id);
            skipped_malformed += 1;
            continue;
        }
        if !is_outflow(tx.amount) {
            continue; // inflows never recur as obligations
        }

        let Some(label) = grouping_label(tx) else {
            warn!("Skipping transaction {}: no merchant or description", tx.id);
            skipped_malformed += 1;
            continue;
        };

        let amount = round_cents(tx.amount);
        let key = format!("{}-{:.2}", label, amount);

        buckets
            .entry(key)
            .or_insert_with(|| Bucket {
                merchant: label.to_string(),
                amount,
                dates: Vec::new(),
            })
            .dates
            .push(tx.date);
    }

    let max_stddev_ms = config.max_interval_stddev_ms();
    let mut patterns = Vec::new();

    for (key, mut bucket) in buckets {
        if bucket.dates.len() < config.min_occurrences {
            continue;
        }

        bucket.dates.sort();

        let intervals: Vec<i64> = bucket
            .dates
            .windows(2)
            .map(|w| (w[1] - w[0]).num_milliseconds())
            .collect();

        let mean = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

        // Population stddev: mean of squared deviations, divided by n
        let variance = intervals
            .iter()
            .map(|&interval| {
                let deviation = interval as f64 - mean;
                deviation * deviation
            })
            .sum::<f64>()
            / intervals.len() as f64;
        let stddev = variance.sqrt();

        if stddev > max_stddev_ms {
            debug!(
                "Dropping {}: interval stddev {:.1}d exceeds the {:.1}d gate",
                key,
                stddev / DAY_MS,
                config.max_interval_stddev_days
            );
            continue;
        }

        let occurrences = bucket.dates.len();
        let last_occurrence = *bucket.dates.last().expect("candidate bucket is non-empty");
        let next_due = last_occurrence + Duration::milliseconds(mean.round() as i64);

        // Clamp the combined expression, not each term: the occurrence
        // bonus alone can push past 1 before the jitter penalty lands
        let confidence = (config.base_confidence
            + occurrences as f64 * config.confidence_per_occurrence
            - stddev / max_stddev_ms)
            .clamp(0.0, 1.0);

        debug!(
            "Accepted {}: {} occurrences, mean interval {:.1}d, confidence {:.2}",
            key,
            occurrences,
            mean / DAY_MS,
            confidence
        );

        patterns.push(DetectedPattern {
            pattern_key: key,
            merchant: bucket.merchant,
            amount: bucket.amount,
            cadence: classify_cadence(mean),
            next_due,
            occurrences: occurrences as i64,
            last_occurrence,
            confidence,
        });
    }

    Detection {
        patterns,
        skipped_malformed,
    }
}

/// A store failure for one pattern; the run continues past these
#[derive(Debug)]
pub struct PatternFailure {
    pub pattern_key: String,
    pub error: String,
}

/// Aggregate report of one detection run
#[derive(Debug, Default)]
pub struct DetectionRun {
    pub detected: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped_malformed: usize,
    pub failures: Vec<PatternFailure>,
}

enum Upserted {
    Inserted,
    Updated,
}

/// Detector wired to the pattern store
pub struct PatternDetector<'a> {
    db: &'a Database,
    config: DetectorConfig,
}

impl<'a> PatternDetector<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            config: DetectorConfig::default(),
        }
    }

    pub fn with_config(db: &'a Database, config: DetectorConfig) -> Self {
        Self { db, config }
    }

    /// Run detection over a user's stored outflows
    ///
    /// An unknown user simply produces an empty run. Only a failure to
    /// read the transaction list propagates as an error.
    pub fn run_for_user(&self, user_id: &str) -> Result<DetectionRun> {
        let transactions = self.db.list_outflows(user_id)?;
        Ok(self.apply(user_id, &transactions))
    }

    /// Run detection over an already-fetched slice (e.g. right after a
    /// feed sync). The slice may be raw or pre-filtered to outflows;
    /// inflows are ignored either way.
    pub fn apply(&self, user_id: &str, transactions: &[Transaction]) -> DetectionRun {
        let detection = detect_patterns(transactions, &self.config);
        let mut run = DetectionRun {
            detected: detection.patterns.len(),
            skipped_malformed: detection.skipped_malformed,
            ..Default::default()
        };

        for pattern in &detection.patterns {
            match self.upsert(user_id, pattern) {
                Ok(Upserted::Inserted) => run.inserted += 1,
                Ok(Upserted::Updated) => run.updated += 1,
                Err(e) => {
                    warn!("Failed to store pattern {}: {}", pattern.pattern_key, e);
                    run.failures.push(PatternFailure {
                        pattern_key: pattern.pattern_key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if !run.failures.is_empty() {
            warn!(
                "{} of {} patterns failed to store",
                run.failures.len(),
                run.detected
            );
        }

        run
    }

    fn upsert(&self, user_id: &str, pattern: &DetectedPattern) -> Result<Upserted> {
        match self.db.find_pattern(user_id, &pattern.pattern_key)? {
            Some(existing) => {
                self.db.patch_pattern(existing.id, pattern)?;
                debug!(
                    "Refreshed pattern {} ({} occurrences)",
                    pattern.pattern_key, pattern.occurrences
                );
                Ok(Upserted::Updated)
            }
            None => {
                let id = self.db.insert_pattern(user_id, pattern)?;
                debug!("Inserted pattern {} as id {}", pattern.pattern_key, id);
                Ok(Upserted::Inserted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn tx(id: i64, merchant: Option<&str>, amount: f64, date: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            user_id: "u1".to_string(),
            merchant: merchant.map(String::from),
            description: None,
            amount,
            date,
            import_hash: format!("hash{}", id),
            created_at: date,
        }
    }

    /// Build a series of `count` charges spaced by `interval`
    fn series(merchant: &str, amount: f64, count: usize, interval: Duration) -> Vec<Transaction> {
        (0..count)
            .map(|i| {
                tx(
                    i as i64,
                    Some(merchant),
                    amount,
                    base_date() + interval * i as i32,
                )
            })
            .collect()
    }

    #[test]
    fn test_is_outflow() {
        assert!(is_outflow(-15.99));
        assert!(!is_outflow(15.99));
        assert!(!is_outflow(0.0));
    }

    #[test]
    fn test_weekly_series_detected() {
        let txs = series("SPOTIFY", -10.99, 4, Duration::days(7));
        let detection = detect_patterns(&txs, &DetectorConfig::default());

        assert_eq!(detection.patterns.len(), 1);
        let p = &detection.patterns[0];
        assert_eq!(p.cadence, Cadence::Weekly);
        assert_eq!(p.occurrences, 4);
        assert_eq!(p.merchant, "SPOTIFY");
        assert_eq!(p.pattern_key, "SPOTIFY--10.99");
        assert_eq!(p.last_occurrence, base_date() + Duration::days(21));
        assert_eq!(p.next_due, base_date() + Duration::days(28));
        assert!((0.0..=1.0).contains(&p.confidence));
    }

    #[test]
    fn test_two_occurrences_never_detected() {
        // Perfect weekly pattern, but the occurrence gate is strictly >= 3
        let txs = series("NETFLIX", -15.99, 2, Duration::days(7));
        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert!(detection.patterns.is_empty());
    }

    #[test]
    fn test_irregular_intervals_gated() {
        // Intervals of 1 and 30 days: population stddev = 14.5 days > 5
        let dates = [
            base_date(),
            base_date() + Duration::days(1),
            base_date() + Duration::days(31),
        ];
        let txs: Vec<_> = dates
            .iter()
            .enumerate()
            .map(|(i, &d)| tx(i as i64, Some("GYM"), -40.0, d))
            .collect();

        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert!(detection.patterns.is_empty());
    }

    #[test]
    fn test_cadence_boundary_weekly() {
        let txs = series("A", -5.0, 3, Duration::days(7));
        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns[0].cadence, Cadence::Weekly);
    }

    #[test]
    fn test_cadence_boundary_biweekly() {
        // Exactly 14 days is still biweekly (inclusive bound)
        let txs = series("B", -5.0, 3, Duration::days(14));
        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns[0].cadence, Cadence::Biweekly);
    }

    #[test]
    fn test_cadence_past_biweekly_is_monthly() {
        // One millisecond past 14 days tips into monthly
        let interval = Duration::days(14) + Duration::milliseconds(1);
        let txs = series("C", -5.0, 3, interval);
        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns[0].cadence, Cadence::Monthly);
    }

    #[test]
    fn test_large_intervals_classify_monthly() {
        // No quarterly/annual class; anything past the table is monthly
        let txs = series("INSURANCE", -320.0, 3, Duration::days(90));
        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns[0].cadence, Cadence::Monthly);
    }

    #[test]
    fn test_netflix_monthly_example() {
        let txs = series("Netflix", -15.99, 3, Duration::days(30));
        let detection = detect_patterns(&txs, &DetectorConfig::default());

        assert_eq!(detection.patterns.len(), 1);
        let p = &detection.patterns[0];
        assert_eq!(p.cadence, Cadence::Monthly);
        assert_eq!(p.occurrences, 3);
        assert_eq!(p.next_due, base_date() + Duration::days(90));
        // 0.5 + 3 * 0.1 - 0 jitter
        assert!((p.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_clamped_at_one() {
        // 8 occurrences push 0.5 + 0.8 past 1.0 before clamping
        let txs = series("SPOTIFY", -10.99, 8, Duration::days(7));
        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns[0].confidence, 1.0);
    }

    #[test]
    fn test_confidence_penalized_by_jitter() {
        // Same occurrence count, jittered intervals score lower
        let steady = series("A", -9.99, 4, Duration::days(30));
        let jittered: Vec<_> = [0i64, 28, 60, 88]
            .iter()
            .enumerate()
            .map(|(i, &d)| tx(i as i64, Some("A"), -9.99, base_date() + Duration::days(d)))
            .collect();

        let config = DetectorConfig::default();
        let steady_conf = detect_patterns(&steady, &config).patterns[0].confidence;
        let jittered_conf = detect_patterns(&jittered, &config).patterns[0].confidence;
        assert!(jittered_conf < steady_conf);
    }

    #[test]
    fn test_inflows_ignored() {
        let txs = series("PAYROLL", 2500.0, 6, Duration::days(14));
        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert!(detection.patterns.is_empty());
        assert_eq!(detection.skipped_malformed, 0);
    }

    #[test]
    fn test_unlabeled_transactions_skipped_not_fatal() {
        let mut txs = series("HULU", -17.99, 3, Duration::days(30));
        // No merchant and no description: malformed, skipped with a warning
        txs.push(tx(99, None, -17.99, base_date() + Duration::days(15)));

        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.skipped_malformed, 1);
        assert_eq!(detection.patterns.len(), 1);
        assert_eq!(detection.patterns[0].occurrences, 3);
    }

    #[test]
    fn test_description_fallback_label() {
        let mut txs = Vec::new();
        for i in 0..3 {
            let mut t = tx(i, None, -12.5, base_date() + Duration::days(7 * i));
            t.description = Some("ACME STORAGE".to_string());
            txs.push(t);
        }

        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns.len(), 1);
        assert_eq!(detection.patterns[0].merchant, "ACME STORAGE");
        assert_eq!(detection.patterns[0].pattern_key, "ACME STORAGE--12.50");
    }

    #[test]
    fn test_amounts_rounded_to_cents_group_together() {
        // -9.999 and -10.001 both round to -10.00 and share a bucket
        let dates = [0i64, 7, 14];
        let amounts = [-9.999, -10.001, -10.0];
        let txs: Vec<_> = dates
            .iter()
            .zip(amounts.iter())
            .enumerate()
            .map(|(i, (&d, &a))| tx(i as i64, Some("COFFEE"), a, base_date() + Duration::days(d)))
            .collect();

        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns.len(), 1);
        assert_eq!(detection.patterns[0].amount, -10.0);
        assert_eq!(detection.patterns[0].occurrences, 3);
    }

    #[test]
    fn test_same_merchant_different_amounts_split() {
        let mut txs = series("AMAZON", -14.99, 3, Duration::days(30));
        txs.extend(series("AMAZON", -7.99, 3, Duration::days(30)));

        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns.len(), 2);
    }

    #[test]
    fn test_unsorted_input_is_ordered_before_intervals() {
        let mut txs = series("NETFLIX", -15.99, 4, Duration::days(30));
        txs.reverse();

        let detection = detect_patterns(&txs, &DetectorConfig::default());
        assert_eq!(detection.patterns.len(), 1);
        assert_eq!(
            detection.patterns[0].next_due,
            base_date() + Duration::days(120)
        );
    }

    #[test]
    fn test_min_occurrences_configurable() {
        let txs = series("NETFLIX", -15.99, 2, Duration::days(30));
        let config = DetectorConfig {
            min_occurrences: 2,
            ..Default::default()
        };

        let detection = detect_patterns(&txs, &config);
        assert_eq!(detection.patterns.len(), 1);
    }
}
