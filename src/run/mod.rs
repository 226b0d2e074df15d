//! Stage entry points used by the binary and by library callers.

mod aggregate;
mod test_run;

pub use aggregate::{run_aggregate, AggregateReport};
pub use test_run::{run_probe, ProbeReport};
