//! External forwarding engine.
//!
//! Renders a record into the engine's configuration document and owns the engine
//! process for the duration of one candidate's test.

mod config;
mod session;

pub use config::build_engine_config;
pub use session::{ForwardingSession, Teardown};
