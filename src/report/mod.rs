//! Ranking and persisting test results.

mod rank;
mod writer;

pub use rank::{rank, Ranking, ReportEntry};
pub use writer::{write_results, ResultFiles};
