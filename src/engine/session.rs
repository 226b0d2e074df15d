//! Forwarding-engine process lifecycle.
//!
//! A session owns exactly one engine process bound to one local port. The process is
//! spawned with `kill_on_drop`, so a session that is dropped on an error or panic
//! path still takes its engine down; the normal path goes through
//! [`ForwardingSession::shutdown`], which terminates gracefully and escalates to a
//! kill once the grace period runs out.

use std::process::Stdio;

use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;

use super::config::build_engine_config;
use crate::config::{EngineSettings, ENGINE_STDERR_TAIL_BYTES};
use crate::descriptor::CanonicalRecord;
use crate::error_handling::SessionError;

/// How an engine process ended during teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The process had already exited on its own.
    AlreadyExited,
    /// The process exited within the grace period after being asked to terminate.
    Terminated,
    /// The process had to be force-killed.
    Killed,
}

/// A running engine listening on `local_port`.
#[derive(Debug)]
pub struct ForwardingSession {
    child: Child,
    local_port: u16,
    settings: EngineSettings,
    stderr_tail: Option<JoinHandle<Vec<u8>>>,
}

impl ForwardingSession {
    /// Spawns the engine for `record`, hands it its configuration over stdin and
    /// waits out the warm-up period.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when the configuration cannot be rendered, the
    /// engine cannot be spawned or fed, or it exits before warm-up ends. The process
    /// is torn down before the error is returned.
    pub async fn start(
        record: &CanonicalRecord,
        local_port: u16,
        settings: &EngineSettings,
    ) -> Result<ForwardingSession, SessionError> {
        let config = build_engine_config(record, local_port);
        let payload = serde_json::to_vec(&config).map_err(SessionError::Config)?;

        let mut child = Command::new(&settings.binary)
            .args(&settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(SessionError::Spawn)?;

        let stderr_tail = child.stderr.take().map(|stderr| tokio::spawn(read_tail(stderr)));
        let stdin = child.stdin.take();
        let mut session = ForwardingSession {
            child,
            local_port,
            settings: settings.clone(),
            stderr_tail,
        };

        if let Err(e) = handoff(stdin, &payload).await {
            session.shutdown().await;
            return Err(SessionError::Handoff(e));
        }

        tokio::time::sleep(settings.warmup).await;

        match session.child.try_wait() {
            Ok(Some(status)) => {
                let tail = session.collect_stderr().await;
                debug!(
                    "Engine on port {} exited during warm-up ({}): {}",
                    local_port,
                    status,
                    tail.trim()
                );
                Err(SessionError::ExitedEarly { status })
            }
            Ok(None) => Ok(session),
            Err(e) => {
                session.shutdown().await;
                Err(SessionError::Spawn(e))
            }
        }
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// OS process id, or `None` once the process has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Terminates the engine and reaps it.
    ///
    /// Sends a graceful termination request, waits up to the configured grace period,
    /// then force-kills. Never fails: a process that cannot be signalled has already
    /// gone away.
    pub async fn shutdown(mut self) -> Teardown {
        let teardown = self.terminate().await;
        let tail = self.collect_stderr().await;
        if !tail.trim().is_empty() {
            debug!(
                "Engine on port {} stderr tail: {}",
                self.local_port,
                tail.trim()
            );
        }
        teardown
    }

    async fn terminate(&mut self) -> Teardown {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Teardown::AlreadyExited;
        }

        if request_termination(&self.child) {
            if let Ok(Ok(_)) =
                tokio::time::timeout(self.settings.kill_grace, self.child.wait()).await
            {
                return Teardown::Terminated;
            }
        }

        if let Err(e) = self.child.start_kill() {
            debug!("Engine on port {} could not be killed: {}", self.local_port, e);
        }
        let _ = self.child.wait().await;
        Teardown::Killed
    }

    async fn collect_stderr(&mut self) -> String {
        match self.stderr_tail.take() {
            Some(handle) => match handle.await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => String::new(),
            },
            None => String::new(),
        }
    }
}

async fn handoff(
    stdin: Option<tokio::process::ChildStdin>,
    payload: &[u8],
) -> Result<(), std::io::Error> {
    let Some(mut stdin) = stdin else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "engine stdin is not available",
        ));
    };
    stdin.write_all(payload).await?;
    stdin.flush().await?;
    // Dropping the handle closes the pipe so the engine sees EOF
    drop(stdin);
    Ok(())
}

/// Drains stderr, keeping only the last `ENGINE_STDERR_TAIL_BYTES`.
async fn read_tail(mut stderr: ChildStderr) -> Vec<u8> {
    let mut tail = Vec::with_capacity(ENGINE_STDERR_TAIL_BYTES);
    let mut buf = [0u8; 1024];
    loop {
        match stderr.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > ENGINE_STDERR_TAIL_BYTES {
                    let excess = tail.len() - ENGINE_STDERR_TAIL_BYTES;
                    tail.drain(..excess);
                }
            }
        }
    }
    tail
}

#[cfg(unix)]
fn request_termination(child: &Child) -> bool {
    let Some(pid) = child.id() else {
        return false;
    };
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: `pid` belongs to a child this session has not reaped yet, so it
    // cannot have been recycled for an unrelated process.
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn request_termination(_child: &Child) -> bool {
    false
}

/// Process-level behaviour relies on `sh`, so these only run on unix.
#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::descriptor::parse_descriptor;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn record() -> CanonicalRecord {
        parse_descriptor("trojan://p@127.0.0.1:443").unwrap()
    }

    fn shell(script: &str) -> EngineSettings {
        EngineSettings {
            binary: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            warmup: Duration::from_millis(150),
            kill_grace: Duration::from_millis(500),
        }
    }

    fn is_alive(pid: u32) -> bool {
        // SAFETY: signal 0 only checks for existence
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    #[tokio::test]
    async fn test_session_terminates_gracefully() {
        let settings = shell("cat >/dev/null; exec sleep 30");
        let session = ForwardingSession::start(&record(), 10_500, &settings)
            .await
            .unwrap();
        assert_eq!(session.local_port(), 10_500);
        let pid = session.pid().unwrap();
        assert!(is_alive(pid));

        assert_eq!(session.shutdown().await, Teardown::Terminated);
        assert!(!is_alive(pid));
    }

    #[tokio::test]
    async fn test_session_escalates_to_kill() {
        let settings = shell("trap '' TERM; cat >/dev/null; exec sleep 30");
        let session = ForwardingSession::start(&record(), 10_501, &settings)
            .await
            .unwrap();
        let pid = session.pid().unwrap();

        let started = Instant::now();
        assert_eq!(session.shutdown().await, Teardown::Killed);
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(!is_alive(pid));
    }

    #[tokio::test]
    async fn test_session_receives_config_on_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("config.json");
        let script = format!("cat > '{}'; exec sleep 30", out.display());
        let session = ForwardingSession::start(&record(), 10_502, &shell(&script))
            .await
            .unwrap();
        session.shutdown().await;

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(written["inbounds"][0]["port"], 10_502);
        assert_eq!(written["outbounds"][0]["protocol"], "trojan");
    }

    #[tokio::test]
    async fn test_early_exit_is_reported() {
        let settings = shell("cat >/dev/null; echo 'bad config' >&2; exit 3");
        let err = ForwardingSession::start(&record(), 10_503, &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ExitedEarly { .. }));
        assert_eq!(err.kind(), crate::error_handling::ErrorKind::XrayCrash);
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_error() {
        let settings = EngineSettings {
            binary: PathBuf::from("/nonexistent/engine"),
            ..shell("")
        };
        let err = ForwardingSession::start(&record(), 10_504, &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_stderr_tail_is_bounded() {
        let mut tail_source = tokio::process::Command::new("sh")
            .args(["-c", "head -c 20000 /dev/zero >&2"])
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let stderr = tail_source.stderr.take().unwrap();
        let tail = read_tail(stderr).await;
        let _ = tail_source.wait().await;
        assert_eq!(tail.len(), ENGINE_STDERR_TAIL_BYTES);
    }
}
