//! Downloading source lists.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, warn};
use reqwest::StatusCode;
use tokio_retry::RetryIf;

use crate::error_handling::{get_retry_strategy, is_retriable_fetch_error};

/// Downloads one source list.
///
/// Transport errors and 5xx answers are retried with exponential backoff. Anything
/// other than a final `200 OK` is logged and yields an empty body, so one broken
/// source never fails the aggregate stage.
pub async fn fetch_source(client: &reqwest::Client, url: &str) -> String {
    let attempts = Arc::new(AtomicU32::new(0));

    let result = RetryIf::start(
        get_retry_strategy(),
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                let response = client.get(url).send().await?.error_for_status()?;
                let status = response.status();
                let body = response.text().await?;
                Ok::<_, reqwest::Error>((status, body))
            }
        },
        is_retriable_fetch_error,
    )
    .await;

    match result {
        Ok((StatusCode::OK, body)) => {
            debug!(
                "Fetched {} ({} bytes, {} attempt(s))",
                url,
                body.len(),
                attempts.load(Ordering::SeqCst)
            );
            body
        }
        Ok((status, _)) => {
            warn!("Failed to fetch {}: status {}", url, status);
            String::new()
        }
        Err(e) => {
            warn!(
                "Failed to fetch {} after {} attempt(s): {}",
                url,
                attempts.load(Ordering::SeqCst),
                e
            );
            String::new()
        }
    }
}

/// Downloads every source concurrently. Bodies come back in the order of `urls`.
pub async fn fetch_all(client: &reqwest::Client, urls: &[String]) -> Vec<String> {
    join_all(urls.iter().map(|url| fetch_source(client, url))).await
}
