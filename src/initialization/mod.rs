//! Application initialization and resource setup.
//!
//! Logger and HTTP clients. Everything here runs before the first source is fetched
//! or the first worker starts, and any failure is fatal.

mod client;
mod logger;

// Re-export public API
pub use client::{init_probe_client, init_source_client};
pub use logger::init_logger_with;
