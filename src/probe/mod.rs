//! Reachability pre-check and end-to-end HTTP probe.

mod http;
mod outcome;
mod tcp;

pub use http::probe_endpoint;
pub use outcome::ProbeOutcome;
pub use tcp::tcp_precheck;
