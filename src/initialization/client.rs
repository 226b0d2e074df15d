//! HTTP client initialization.
//!
//! Two kinds of client exist: one shared client for downloading source lists, and
//! one client per worker lane that sends every request through that worker's local
//! forwarding port.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{ClientBuilder, Proxy};

use crate::config::ProbeSettings;

/// Builds the shared client used to download source lists.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_source_client(timeout: Duration) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(timeout)
        .user_agent(concat!("proxy_sieve/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(Arc::new(client))
}

/// Builds a probe client routed through the HTTP proxy on `127.0.0.1:local_port`.
///
/// Redirects are not followed, so a redirect answer is classified by its own
/// status. Idle connections are not pooled: the engine behind the port changes with
/// every candidate and a pooled connection would reach the previous one.
///
/// # Errors
///
/// Returns a `reqwest::Error` if the proxy URL or the client cannot be built.
pub fn init_probe_client(
    local_port: u16,
    settings: &ProbeSettings,
) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .proxy(Proxy::all(format!("http://127.0.0.1:{local_port}"))?)
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .timeout(settings.probe_timeout)
        .build()
}
