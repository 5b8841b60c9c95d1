//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cadence - track recurring charges in transaction history
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Detect and track recurring charges", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "cadence.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import transactions from CSV
    Import {
        /// CSV file to import (Date,Merchant,Description,Amount)
        #[arg(short, long)]
        file: PathBuf,

        /// User the transactions belong to
        #[arg(short, long)]
        user: String,

        /// Skip pattern detection after import
        #[arg(long)]
        no_detect: bool,
    },

    /// Run recurring pattern detection
    Detect {
        /// User to run detection for
        #[arg(short, long)]
        user: String,

        /// Detection thresholds TOML (defaults used when absent)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List detected recurring patterns
    Patterns {
        /// User whose patterns to list
        #[arg(short, long)]
        user: String,

        /// Emit JSON instead of a plain listing
        #[arg(long)]
        json: bool,
    },

    /// Show patterns due within a window (upcoming deductions)
    Upcoming {
        /// User whose patterns to check
        #[arg(short, long)]
        user: String,

        /// Window in days
        #[arg(short, long, default_value = "30")]
        days: i64,

        /// Emit JSON instead of a plain listing
        #[arg(long)]
        json: bool,
    },

    /// List imported transactions
    Transactions {
        /// User whose transactions to list
        #[arg(short, long)]
        user: String,

        /// Maximum rows to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show database status
    Status,
}
