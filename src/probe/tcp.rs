//! TCP reachability pre-check.

use std::time::Duration;

use log::debug;
use tokio::net::TcpStream;

/// Returns `true` when a bare TCP connection to `address:port` opens within `timeout`.
///
/// The connection is dropped immediately; nothing is sent.
pub async fn tcp_precheck(address: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect((address, port))).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            debug!("TCP pre-check to {}:{} failed: {}", address, port, e);
            false
        }
        Err(_) => {
            debug!("TCP pre-check to {}:{} timed out", address, port);
            false
        }
    }
}
