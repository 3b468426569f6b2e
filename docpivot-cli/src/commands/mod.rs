//! CLI command handlers.

pub mod config;
pub mod detect;
pub mod load;
