//! Operator-facing plumbing: progress lines, end-of-stage summaries and Ctrl-C handling.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use shutdown::{shutdown_gracefully, watch_for_interrupt};
pub use statistics::{print_parse_statistics, print_run_statistics};
