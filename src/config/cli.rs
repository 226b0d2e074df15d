//! Command-line options.
//!
//! Every operational parameter is a flag with a `PROXY_SIEVE_*` environment fallback,
//! so a `.env` file can pin the engine path or port range without touching scripts.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::constants::*;
use crate::config::types::{
    AggregateConfig, EngineSettings, LogFormat, LogLevel, ProbeConfig, ProbeSettings,
};

/// Collects, deduplicates and validates proxy descriptors.
///
/// ```bash
/// # Build the deduplicated record document from sources.txt
/// proxy_sieve aggregate --sources sources.txt
///
/// # Validate it with 40 workers starting at port 20000
/// proxy_sieve test --input unique_configs.json --concurrency 40 --port-start 20000
///
/// # Both stages in one go
/// proxy_sieve refine
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "proxy_sieve",
    version,
    about = "Collects proxy descriptors, removes duplicates and keeps the ones that actually work."
)]
pub struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info, env = "PROXY_SIEVE_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain, env = "PROXY_SIEVE_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch source lists, parse and deduplicate descriptors into a record document
    Aggregate(AggregateArgs),
    /// Validate descriptors through the forwarding engine and rank the working ones
    Test(TestArgs),
    /// Run `aggregate` and then `test` on the freshly written document
    Refine {
        #[command(flatten)]
        aggregate: AggregateArgs,
        #[command(flatten)]
        test: TestRunArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct AggregateArgs {
    /// Newline-delimited list of source URLs
    #[arg(long, default_value = DEFAULT_SOURCES_FILE, env = "PROXY_SIEVE_SOURCES")]
    pub sources: PathBuf,

    /// Output path of the deduplicated record document
    #[arg(long = "records", default_value = DEFAULT_RECORDS_FILE, env = "PROXY_SIEVE_RECORDS")]
    pub records: PathBuf,

    /// Per-source download timeout in seconds
    #[arg(long, default_value_t = SOURCE_FETCH_TIMEOUT.as_secs(), env = "PROXY_SIEVE_FETCH_TIMEOUT")]
    pub fetch_timeout_seconds: u64,
}

#[derive(Debug, Clone, Args)]
pub struct TestArgs {
    /// Record document (.json) or plain descriptor list to validate
    #[arg(long, default_value = DEFAULT_RECORDS_FILE, env = "PROXY_SIEVE_INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub run: TestRunArgs,
}

/// Test-stage knobs shared by `test` and `refine`.
#[derive(Debug, Clone, Args)]
pub struct TestRunArgs {
    /// Directory receiving one timestamped sub-directory per run
    #[arg(long, default_value = DEFAULT_RESULTS_DIR, env = "PROXY_SIEVE_RESULTS_DIR")]
    pub results_dir: PathBuf,

    /// Number of concurrent workers (one local port each)
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, env = "PROXY_SIEVE_CONCURRENCY")]
    pub concurrency: usize,

    /// First local port; worker i listens on port-start + i
    #[arg(long, default_value_t = DEFAULT_PORT_START, env = "PROXY_SIEVE_PORT_START")]
    pub port_start: u16,

    /// Forwarding engine executable
    #[arg(long, default_value = DEFAULT_ENGINE_BIN, env = "PROXY_SIEVE_ENGINE")]
    pub engine: PathBuf,

    /// TCP pre-check timeout in milliseconds
    #[arg(long, default_value_t = TCP_PRECHECK_TIMEOUT_MS, env = "PROXY_SIEVE_TCP_TIMEOUT_MS")]
    pub tcp_timeout_ms: u64,

    /// HTTP probe timeout in milliseconds
    #[arg(long, default_value_t = PROBE_TIMEOUT_MS, env = "PROXY_SIEVE_PROBE_TIMEOUT_MS")]
    pub probe_timeout_ms: u64,

    /// Engine warm-up before probing, in milliseconds
    #[arg(long, default_value_t = ENGINE_WARMUP_MS, env = "PROXY_SIEVE_WARMUP_MS")]
    pub warmup_ms: u64,

    /// Grace period between terminate and force-kill, in milliseconds
    #[arg(long, default_value_t = ENGINE_KILL_GRACE_MS, env = "PROXY_SIEVE_KILL_GRACE_MS")]
    pub kill_grace_ms: u64,

    /// Endpoint fetched through each forwarding session
    #[arg(long, default_value = DEFAULT_PROBE_URL, env = "PROXY_SIEVE_PROBE_URL")]
    pub probe_url: String,

    /// Accepted probe statuses, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_ACCEPTED_STATUSES.to_vec(), env = "PROXY_SIEVE_ACCEPT_STATUS")]
    pub accept_status: Vec<u16>,

    /// Log a progress line every N tested candidates
    #[arg(long, default_value_t = PROGRESS_INTERVAL, env = "PROXY_SIEVE_PROGRESS_INTERVAL")]
    pub progress_interval: usize,
}

impl From<AggregateArgs> for AggregateConfig {
    fn from(args: AggregateArgs) -> Self {
        AggregateConfig {
            sources_file: args.sources,
            output_file: args.records,
            fetch_timeout: std::time::Duration::from_secs(args.fetch_timeout_seconds),
        }
    }
}

impl TestRunArgs {
    /// Builds the library configuration for validating `input_file`.
    pub fn into_config(self, input_file: PathBuf) -> ProbeConfig {
        use std::time::Duration;

        ProbeConfig {
            input_file,
            results_dir: self.results_dir,
            concurrency: self.concurrency,
            port_start: self.port_start,
            progress_interval: self.progress_interval,
            engine: EngineSettings {
                binary: self.engine,
                warmup: Duration::from_millis(self.warmup_ms),
                kill_grace: Duration::from_millis(self.kill_grace_ms),
                ..Default::default()
            },
            probe: ProbeSettings {
                target_url: self.probe_url,
                accepted_statuses: self.accept_status,
                tcp_timeout: Duration::from_millis(self.tcp_timeout_ms),
                probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            },
        }
    }
}

impl From<TestArgs> for ProbeConfig {
    fn from(args: TestArgs) -> Self {
        args.run.into_config(args.input)
    }
}
