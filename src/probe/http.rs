//! End-to-end HTTP probe through a forwarding session.

use std::time::{Duration, Instant};

use log::debug;

use super::outcome::ProbeOutcome;
use crate::error_handling::{categorize_probe_error, ErrorKind};

/// Sends one GET to `target_url` with `client` and classifies the result.
///
/// Latency is the wall-clock time until the response head arrives, in whole
/// milliseconds. `deadline` bounds the whole request independently of any
/// timeout configured on the client.
pub async fn probe_endpoint(
    client: &reqwest::Client,
    target_url: &str,
    accepted_statuses: &[u16],
    deadline: Duration,
) -> ProbeOutcome {
    let start = Instant::now();
    let response = match tokio::time::timeout(deadline, client.get(target_url).send()).await {
        Err(_) => return ProbeOutcome::failed(ErrorKind::Timeout),
        Ok(Err(e)) => {
            debug!("Probe to {} failed: {}", target_url, e);
            return ProbeOutcome::failed(categorize_probe_error(&e));
        }
        Ok(Ok(response)) => response,
    };
    let delay_ms = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);

    let status = response.status().as_u16();
    if accepted_statuses.contains(&status) {
        ProbeOutcome::passed(delay_ms)
    } else {
        ProbeOutcome::failed(ErrorKind::HttpStatus(status))
    }
}
