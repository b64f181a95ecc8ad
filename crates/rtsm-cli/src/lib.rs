//! CLI library components for the randomization tool.

pub mod config;
pub mod logging;
