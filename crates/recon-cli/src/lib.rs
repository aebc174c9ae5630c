//! CLI library components for catalog reconciliation.

pub mod commands;
pub mod logging;
pub mod types;
