//! Configuration types.
//!
//! Library-side configuration structs. These carry no CLI dependency and can be
//! built programmatically; the binary converts its parsed arguments into them.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::*;
use crate::error_handling::InitializationError;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: coloured, human-readable lines (default)
/// - `Json`: one JSON object per line
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Configuration of the aggregate stage (fetch, extract, parse, dedup).
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Newline-delimited list of source URLs (`#` comments allowed)
    pub sources_file: PathBuf,
    /// Where the deduplicated record document is written
    pub output_file: PathBuf,
    /// Per-request timeout for source downloads
    pub fetch_timeout: Duration,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            sources_file: PathBuf::from(DEFAULT_SOURCES_FILE),
            output_file: PathBuf::from(DEFAULT_RECORDS_FILE),
            fetch_timeout: SOURCE_FETCH_TIMEOUT,
        }
    }
}

/// How the external forwarding engine is launched and torn down.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Engine executable
    pub binary: PathBuf,
    /// Arguments making the engine read its config from stdin
    pub args: Vec<String>,
    /// Grace period after config handoff before probing
    pub warmup: Duration,
    /// Time allowed for graceful exit before force-kill
    pub kill_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_ENGINE_BIN),
            args: DEFAULT_ENGINE_ARGS.iter().map(|a| a.to_string()).collect(),
            warmup: Duration::from_millis(ENGINE_WARMUP_MS),
            kill_grace: Duration::from_millis(ENGINE_KILL_GRACE_MS),
        }
    }
}

/// Probe target and deadlines.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Endpoint fetched through the forwarding session
    pub target_url: String,
    /// Statuses that count as a working proxy
    pub accepted_statuses: Vec<u16>,
    /// Deadline of the bare TCP pre-check
    pub tcp_timeout: Duration,
    /// Deadline of the HTTP probe
    pub probe_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_PROBE_URL.to_string(),
            accepted_statuses: DEFAULT_ACCEPTED_STATUSES.to_vec(),
            tcp_timeout: Duration::from_millis(TCP_PRECHECK_TIMEOUT_MS),
            probe_timeout: Duration::from_millis(PROBE_TIMEOUT_MS),
        }
    }
}

/// Configuration of the test stage.
///
/// # Examples
///
/// ```no_run
/// use proxy_sieve::ProbeConfig;
/// use std::path::PathBuf;
///
/// let config = ProbeConfig {
///     input_file: PathBuf::from("unique_configs.json"),
///     concurrency: 40,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Record document (`.json`) or plain descriptor list
    pub input_file: PathBuf,
    /// Parent directory of the timestamped results directory
    pub results_dir: PathBuf,
    /// Worker pool size
    pub concurrency: usize,
    /// First local port; worker `i` listens on `port_start + i`
    pub port_start: u16,
    /// Log progress every this many tested candidates
    pub progress_interval: usize,
    pub engine: EngineSettings,
    pub probe: ProbeSettings,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from(DEFAULT_RECORDS_FILE),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            port_start: DEFAULT_PORT_START,
            progress_interval: PROGRESS_INTERVAL,
            engine: EngineSettings::default(),
            probe: ProbeSettings::default(),
        }
    }
}

impl ProbeConfig {
    /// Rejects settings that would make the pool unusable.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` for zero workers, a port range running past
    /// 65535, or an empty accepted-status list.
    pub fn validate(&self) -> Result<(), InitializationError> {
        crate::tester::check_port_range(self.port_start, self.concurrency)?;
        if self.probe.accepted_statuses.is_empty() {
            return Err(InitializationError::InvalidConfigError(
                "at least one accepted status is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_probe_config_default() {
        let config = ProbeConfig::default();
        assert_eq!(config.concurrency, 80);
        assert_eq!(config.port_start, 10000);
        assert_eq!(config.probe.tcp_timeout, Duration::from_millis(1500));
        assert_eq!(config.probe.probe_timeout, Duration::from_millis(3000));
        assert_eq!(config.probe.accepted_statuses, vec![204, 200]);
        assert_eq!(config.engine.args, vec!["-config", "stdin:"]);
        assert_eq!(config.engine.warmup, Duration::from_millis(500));
    }

    #[test]
    fn test_probe_config_validation() {
        assert!(ProbeConfig::default().validate().is_ok());

        let config = ProbeConfig {
            port_start: 65_500,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(InitializationError::PortRangeError { .. })
        ));

        let mut config = ProbeConfig::default();
        config.probe.accepted_statuses.clear();
        assert!(matches!(
            config.validate(),
            Err(InitializationError::InvalidConfigError(_))
        ));
    }

    #[test]
    fn test_aggregate_config_default() {
        let config = AggregateConfig::default();
        assert_eq!(config.sources_file, PathBuf::from("sources.txt"));
        assert_eq!(config.output_file, PathBuf::from("unique_configs.json"));
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
    }
}
