//! proxy_sieve library: collect, deduplicate and validate proxy descriptors
//!
//! The pipeline has two stages. [`run_aggregate`] downloads source lists, extracts
//! `vmess://`, `vless://`, `trojan://` and `ss://` descriptors, parses them into
//! [`descriptor::CanonicalRecord`]s and keeps one record per server identity.
//! [`run_probe`] then tests every record through an external forwarding engine
//! with a bounded pool of workers, one local port per worker, and writes the
//! ranked results.
//!
//! # Example
//!
//! ```no_run
//! use proxy_sieve::{run_aggregate, run_probe, AggregateConfig, ProbeConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let aggregate = run_aggregate(AggregateConfig::default()).await?;
//! println!("{} unique records", aggregate.stats.unique);
//!
//! let report = run_probe(ProbeConfig {
//!     input_file: aggregate.output_file,
//!     concurrency: 40,
//!     ..Default::default()
//! })
//! .await?;
//! println!("{} of {} passed", report.passed, report.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. The test stage also needs the forwarding
//! engine executable (`./bin/xray` by default), which reads its configuration
//! from stdin.

mod app;
pub mod config;
pub mod dedup;
pub mod descriptor;
pub mod engine;
pub mod error_handling;
pub mod initialization;
pub mod probe;
pub mod report;
mod run;
pub mod sources;
pub mod storage;
pub mod tester;

// Re-export public API
pub use config::{AggregateConfig, LogFormat, LogLevel, ProbeConfig};
pub use run::{run_aggregate, run_probe, AggregateReport, ProbeReport};
