//! Configuration constants.
//!
//! Defaults for every operational parameter of the aggregate and test stages.
//! The CLI and the library `Default` impls both read from here.

use std::time::Duration;

/// Number of concurrently running test workers.
pub const DEFAULT_CONCURRENCY: usize = 80;
/// First local port handed to a worker; worker `i` owns `DEFAULT_PORT_START + i`.
pub const DEFAULT_PORT_START: u16 = 10000;

// Per-stage deadlines
/// Bare TCP reachability pre-check deadline in milliseconds
pub const TCP_PRECHECK_TIMEOUT_MS: u64 = 1500;
/// End-to-end HTTP probe deadline in milliseconds
pub const PROBE_TIMEOUT_MS: u64 = 3000;
/// Grace period after config handoff before the engine listener is probed
pub const ENGINE_WARMUP_MS: u64 = 500;
/// How long a terminated engine gets to exit before it is force-killed
pub const ENGINE_KILL_GRACE_MS: u64 = 2000;

// Probe target
/// Well-known endpoint answering `204 No Content`
pub const DEFAULT_PROBE_URL: &str = "http://cp.cloudflare.com/";
/// Statuses counted as a working proxy (204 primary, 200 tolerated)
pub const DEFAULT_ACCEPTED_STATUSES: &[u16] = &[204, 200];

// Forwarding engine
/// Path of the forwarding engine executable
pub const DEFAULT_ENGINE_BIN: &str = "./bin/xray";
/// Arguments telling the engine to read its configuration from stdin
pub const DEFAULT_ENGINE_ARGS: &[&str] = &["-config", "stdin:"];
/// Fallback outbound port when a record carries no usable port
pub const FALLBACK_OUTBOUND_PORT: u16 = 443;
/// Bytes of engine stderr kept for diagnostics
pub const ENGINE_STDERR_TAIL_BYTES: usize = 4096;

// Source fetching
/// Per-request timeout when downloading a source list
pub const SOURCE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Initial delay in milliseconds before the first fetch retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which the retry delay grows on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 5;
/// Maximum number of retries after a failed fetch
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// Files
pub const DEFAULT_SOURCES_FILE: &str = "sources.txt";
pub const DEFAULT_RECORDS_FILE: &str = "unique_configs.json";
pub const DEFAULT_RESULTS_DIR: &str = "local_results";
pub const DETAILED_RESULTS_FILE: &str = "detailed_results.json";
pub const PASSED_DESCRIPTORS_FILE: &str = "real_delay_passed.txt";

/// Log a progress line every this many tested candidates
pub const PROGRESS_INTERVAL: usize = 100;

/// Length of the descriptor prefix shown in per-candidate log lines
pub const LOG_DESCRIPTOR_PREFIX: usize = 50;
