//! Error categorization and retry strategy.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::ErrorKind;

/// Creates the exponential backoff used when downloading source lists.
///
/// Starts at `RETRY_INITIAL_DELAY_MS`, multiplies by `RETRY_FACTOR`, caps each delay at
/// `RETRY_MAX_DELAY_SECS` and yields at most `RETRY_MAX_ATTEMPTS` delays.
pub fn get_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
        .take(crate::config::RETRY_MAX_ATTEMPTS)
}

/// Categorizes a probe-time `reqwest::Error` into an `ErrorKind`.
///
/// Timeouts stay distinct from everything else; a status carried by the error is
/// reported as `HTTP_<status>`; anything that kept the request from completing
/// through the local listener is a `ConnectionError`.
pub fn categorize_probe_error(error: &reqwest::Error) -> ErrorKind {
    if let Some(status) = error.status() {
        return ErrorKind::HttpStatus(status.as_u16());
    }

    if error.is_timeout() {
        ErrorKind::Timeout
    } else {
        ErrorKind::ConnectionError
    }
}

/// Whether a failed source download is worth another attempt.
///
/// Transport failures, 429 and 5xx answers are transient; other 4xx answers are not.
pub fn is_retriable_fetch_error(error: &reqwest::Error) -> bool {
    match error.status() {
        Some(status) => status.is_server_error() || status.as_u16() == 429,
        None => error.is_timeout() || error.is_connect() || error.is_request(),
    }
}
