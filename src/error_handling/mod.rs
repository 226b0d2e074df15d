//! Error handling and run statistics.
//!
//! This module provides:
//! - Boundary error types for initialization, descriptor parsing and engine sessions
//! - The per-candidate failure classification (`ErrorKind`)
//! - Counters for the aggregate and test stages
//!
//! Only initialization errors are fatal. Parse failures and candidate failures are
//! recovered where they happen and surface as counters.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_probe_error, get_retry_strategy, is_retriable_fetch_error};
pub use stats::{ParseStatistics, RunStatistics};
pub use types::{DescriptorError, ErrorKind, InitializationError, ParseFailureKind, SessionError};
