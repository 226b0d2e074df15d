//! Application configuration and constants.
//!
//! This module provides:
//! - Default values for every operational parameter
//! - Library configuration structs (no CLI dependency)
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

pub use cli::{AggregateArgs, Cli, Command, TestArgs, TestRunArgs};
pub use constants::*;
pub use types::{
    AggregateConfig, EngineSettings, LogFormat, LogLevel, ProbeConfig, ProbeSettings,
};
