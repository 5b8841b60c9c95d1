//! Detector configuration
//!
//! Thresholds ship with defaults matching the production detection rules
//! and can be overridden from an optional `cadence.toml` file:
//!
//! ```toml
//! [detection]
//! min_occurrences = 3
//! max_interval_stddev_days = 5.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One day in milliseconds
pub(crate) const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Detection thresholds
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum matched transactions before a group becomes a candidate
    pub min_occurrences: usize,
    /// Regularity gate: maximum population stddev of the occurrence
    /// intervals, in days. Also the denominator of the confidence
    /// jitter penalty, so tightening the gate steepens the penalty.
    pub max_interval_stddev_days: f64,
    /// Confidence baseline
    pub base_confidence: f64,
    /// Confidence added per matched occurrence
    pub confidence_per_occurrence: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            max_interval_stddev_days: 5.0,
            base_confidence: 0.5,
            confidence_per_occurrence: 0.1,
        }
    }
}

impl DetectorConfig {
    /// Regularity gate in milliseconds
    pub fn max_interval_stddev_ms(&self) -> f64 {
        self.max_interval_stddev_days * DAY_MS
    }

    /// Load thresholds from a TOML file, keeping defaults for any value
    /// the file does not set
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidData(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(detection) = raw.detection {
            if let Some(v) = detection.min_occurrences {
                config.min_occurrences = v;
            }
            if let Some(v) = detection.max_interval_stddev_days {
                config.max_interval_stddev_days = v;
            }
            if let Some(v) = detection.base_confidence {
                config.base_confidence = v;
            }
            if let Some(v) = detection.confidence_per_occurrence {
                config.confidence_per_occurrence = v;
            }
        }

        Ok(config)
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    detection: Option<RawDetection>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    min_occurrences: Option<usize>,
    max_interval_stddev_days: Option<f64>,
    base_confidence: Option<f64>,
    confidence_per_occurrence: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.min_occurrences, 3);
        assert_eq!(config.max_interval_stddev_days, 5.0);
        assert_eq!(config.max_interval_stddev_ms(), 5.0 * 24.0 * 3600.0 * 1000.0);
    }

    #[test]
    fn test_parse_partial_override() {
        let config = DetectorConfig::parse(
            r#"
            [detection]
            min_occurrences = 4
            max_interval_stddev_days = 3.5
            "#,
        )
        .unwrap();

        assert_eq!(config.min_occurrences, 4);
        assert_eq!(config.max_interval_stddev_days, 3.5);
        // Untouched values keep their defaults
        assert_eq!(config.base_confidence, 0.5);
        assert_eq!(config.confidence_per_occurrence, 0.1);
    }

    #[test]
    fn test_parse_empty_file_is_defaults() {
        let config = DetectorConfig::parse("").unwrap();
        assert_eq!(config.min_occurrences, 3);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = DetectorConfig::parse("[detection\nmin_occurrences = 4");
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
