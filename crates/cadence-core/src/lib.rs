//! Cadence Core Library
//!
//! Shared functionality for the Cadence recurring charge tracker:
//! - SQLite storage for transactions and detected recurring patterns
//! - CSV import for transaction feeds
//! - Recurring pattern detection (grouping, interval statistics,
//!   cadence classification, due-date prediction)
//! - Detector threshold configuration

pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod import;
pub mod models;

pub use config::DetectorConfig;
pub use db::Database;
pub use detect::{
    detect_patterns, is_outflow, Detection, DetectionRun, PatternDetector, PatternFailure,
};
pub use error::{Error, Result};
pub use import::{parse_csv, parse_instant};
pub use models::{Cadence, DetectedPattern, NewTransaction, RecurringPattern, Transaction};
