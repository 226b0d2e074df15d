//! Testing one candidate end to end.

use std::future::Future;

use log::debug;

use crate::config::{EngineSettings, ProbeSettings, LOG_DESCRIPTOR_PREFIX};
use crate::descriptor::CanonicalRecord;
use crate::engine::ForwardingSession;
use crate::error_handling::{ErrorKind, InitializationError};
use crate::initialization::init_probe_client;
use crate::probe::{probe_endpoint, tcp_precheck, ProbeOutcome};

/// Something that can turn a record into a [`ProbeOutcome`].
///
/// Each worker builds one `Lane` for its local port when the pool starts and reuses
/// it for every candidate it pulls, so per-port resources are set up once.
pub trait CandidateTester: Send + Sync + 'static {
    type Lane: Send + 'static;

    /// Prepares the per-worker state bound to `local_port`.
    fn lane(&self, local_port: u16) -> Result<Self::Lane, InitializationError>;

    /// Tests `record` using the worker's lane.
    fn test(
        &self,
        lane: &mut Self::Lane,
        record: &CanonicalRecord,
    ) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Per-worker probe state: the owned local port and a client proxied through it.
#[derive(Debug)]
pub struct ProbeLane {
    local_port: u16,
    client: reqwest::Client,
}

impl ProbeLane {
    pub fn local_port(&self) -> u16 {
        self.local_port
    }
}

/// Tests candidates through the external forwarding engine.
#[derive(Debug, Clone)]
pub struct EngineTester {
    engine: EngineSettings,
    probe: ProbeSettings,
}

impl EngineTester {
    pub fn new(engine: EngineSettings, probe: ProbeSettings) -> Self {
        Self { engine, probe }
    }
}

impl CandidateTester for EngineTester {
    type Lane = ProbeLane;

    fn lane(&self, local_port: u16) -> Result<ProbeLane, InitializationError> {
        Ok(ProbeLane {
            local_port,
            client: init_probe_client(local_port, &self.probe)?,
        })
    }

    /// TCP pre-check, then session, probe and teardown, strictly in that order.
    ///
    /// An unreachable server never gets an engine process.
    async fn test(&self, lane: &mut ProbeLane, record: &CanonicalRecord) -> ProbeOutcome {
        if !tcp_precheck(record.address(), record.port(), self.probe.tcp_timeout).await {
            return ProbeOutcome::failed(ErrorKind::TcpFailed);
        }

        let session = match ForwardingSession::start(record, lane.local_port, &self.engine).await {
            Ok(session) => session,
            Err(e) => {
                debug!(
                    "Session for {} on port {} failed: {}",
                    descriptor_prefix(record),
                    lane.local_port,
                    e
                );
                return ProbeOutcome::failed(e.kind());
            }
        };

        let outcome = probe_endpoint(
            &lane.client,
            &self.probe.target_url,
            &self.probe.accepted_statuses,
            self.probe.probe_timeout,
        )
        .await;
        session.shutdown().await;
        outcome
    }
}

/// Leading characters of the raw descriptor, for log lines.
pub(crate) fn descriptor_prefix(record: &CanonicalRecord) -> &str {
    match record.raw_uri.char_indices().nth(LOG_DESCRIPTOR_PREFIX) {
        Some((idx, _)) => &record.raw_uri[..idx],
        None => &record.raw_uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parse_descriptor;
    use std::path::PathBuf;
    use std::time::Duration;

    fn tester_with_missing_engine() -> EngineTester {
        EngineTester::new(
            EngineSettings {
                binary: PathBuf::from("/nonexistent/engine"),
                ..EngineSettings::default()
            },
            ProbeSettings {
                tcp_timeout: Duration::from_millis(500),
                ..ProbeSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_unreachable_server_skips_the_engine() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let record = parse_descriptor(&format!("trojan://p@127.0.0.1:{port}")).unwrap();
        let tester = tester_with_missing_engine();
        let mut lane = tester.lane(10_600).unwrap();

        // A spawn attempt would have reported XrayCrash
        let outcome = tester.test(&mut lane, &record).await;
        assert_eq!(outcome, ProbeOutcome::failed(ErrorKind::TcpFailed));
    }

    #[tokio::test]
    async fn test_reachable_server_with_missing_engine_is_a_crash() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let record = parse_descriptor(&format!("trojan://p@127.0.0.1:{port}")).unwrap();
        let tester = tester_with_missing_engine();
        let mut lane = tester.lane(10_601).unwrap();

        let outcome = tester.test(&mut lane, &record).await;
        assert_eq!(outcome, ProbeOutcome::failed(ErrorKind::XrayCrash));
        assert_eq!(lane.local_port(), 10_601);
    }

    #[test]
    fn test_descriptor_prefix_is_char_safe() {
        let record = parse_descriptor(&format!("trojan://p@1.2.3.4:443#{}", "é".repeat(80))).unwrap();
        assert_eq!(descriptor_prefix(&record).chars().count(), LOG_DESCRIPTOR_PREFIX);
        let short = parse_descriptor("trojan://p@1.2.3.4:443").unwrap();
        assert_eq!(descriptor_prefix(&short), short.raw_uri);
    }
}
