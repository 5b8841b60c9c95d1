//! Command implementations

mod core;
mod import;
mod patterns;
mod transactions;

pub use core::{cmd_detect, cmd_init, cmd_status, open_db};
pub use import::cmd_import;
pub use patterns::{cmd_patterns, cmd_upcoming};
pub use transactions::cmd_transactions;
