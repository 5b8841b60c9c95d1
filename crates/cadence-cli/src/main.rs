//! Cadence CLI - recurring charge tracker
//!
//! Usage:
//!   cadence init                          Initialize database
//!   cadence import --file CSV --user U    Import a transaction feed
//!   cadence detect --user U               Detect recurring patterns
//!   cadence upcoming --user U             Show upcoming deductions

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Import {
            file,
            user,
            no_detect,
        } => commands::cmd_import(&cli.db, &file, &user, no_detect),
        Commands::Detect { user, config } => {
            commands::cmd_detect(&cli.db, &user, config.as_deref())
        }
        Commands::Patterns { user, json } => commands::cmd_patterns(&cli.db, &user, json),
        Commands::Upcoming { user, days, json } => {
            commands::cmd_upcoming(&cli.db, &user, days, json)
        }
        Commands::Transactions { user, limit } => {
            commands::cmd_transactions(&cli.db, &user, limit)
        }
        Commands::Status => commands::cmd_status(&cli.db),
    }
}
