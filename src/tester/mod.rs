//! Test orchestration: per-candidate pipeline and the worker pool that drives it.

mod candidate;
mod pool;

pub use candidate::{CandidateTester, EngineTester, ProbeLane};
pub use pool::{check_port_range, run_pool, PoolSettings, TestRun, TestedRecord};
