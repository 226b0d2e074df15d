//! The test stage: record document to ranked result files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::app::{print_run_statistics, shutdown_gracefully, watch_for_interrupt};
use crate::config::ProbeConfig;
use crate::error_handling::RunStatistics;
use crate::report::{rank, write_results, ReportEntry};
use crate::storage::load_records;
use crate::tester::{run_pool, EngineTester, PoolSettings};

/// Results of a test run.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Candidates tested
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Per-kind failure counters
    pub stats: RunStatistics,
    /// Input entries that could not be turned into a record
    pub skipped_invalid: usize,
    /// Input entries naming an unsupported protocol
    pub skipped_unknown: usize,
    /// Candidates left untested after an interrupt
    pub skipped_interrupted: usize,
    /// Timestamped directory holding the result files
    pub results_dir: PathBuf,
    pub elapsed_seconds: f64,
}

/// Loads the candidates, tests them through the forwarding engine and writes the
/// ranked results.
///
/// # Errors
///
/// Fails before any worker starts if the configuration is invalid, the input file
/// cannot be read, or it holds no usable candidate. Failures of individual
/// candidates never fail the run.
pub async fn run_probe(config: ProbeConfig) -> Result<ProbeReport> {
    let start_time = Instant::now();
    config.validate().context("Invalid test configuration")?;

    let loaded = load_records(&config.input_file)?;
    if loaded.invalid > 0 {
        warn!("Skipped {} invalid input entries", loaded.invalid);
    }
    if loaded.unknown > 0 {
        warn!(
            "Skipped {} entries with an unsupported protocol",
            loaded.unknown
        );
    }
    if loaded.records.is_empty() {
        bail!(
            "No candidates to test in {}",
            config.input_file.display()
        );
    }

    let engine_binary = &config.engine.binary;
    if engine_binary.components().count() > 1 && !engine_binary.exists() {
        warn!(
            "Engine binary {} not found; every reachable candidate will fail with XrayCrash",
            engine_binary.display()
        );
    }

    info!(
        "Testing {} candidates with {} workers from port {}",
        loaded.records.len(),
        config.concurrency.min(loaded.records.len()),
        config.port_start
    );

    let tester = Arc::new(EngineTester::new(config.engine.clone(), config.probe.clone()));
    let cancel = CancellationToken::new();
    let watcher = watch_for_interrupt(cancel.clone());
    let run = run_pool(
        tester,
        loaded.records,
        PoolSettings {
            concurrency: config.concurrency,
            port_start: config.port_start,
            progress_interval: config.progress_interval,
        },
        cancel.clone(),
    )
    .await;
    shutdown_gracefully(cancel, watcher).await;
    let run = run.context("Failed to start test workers")?;

    // Outputs are written only after every worker has finished
    let ranking = rank(run.tested.into_iter().map(ReportEntry::from));
    let files = write_results(&config.results_dir, &ranking)?;

    let elapsed_seconds = start_time.elapsed().as_secs_f64();
    print_run_statistics(&run.stats, elapsed_seconds);
    info!("Results saved in {}", files.directory.display());

    Ok(ProbeReport {
        total: run.stats.total(),
        passed: run.stats.passed(),
        failed: run.stats.failed(),
        stats: run.stats,
        skipped_invalid: loaded.invalid,
        skipped_unknown: loaded.unknown,
        skipped_interrupted: run.skipped,
        results_dir: files.directory,
        elapsed_seconds,
    })
}
