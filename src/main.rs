//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `proxy_sieve` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use proxy_sieve::config::{Cli, Command, ProbeConfig};
use proxy_sieve::initialization::init_logger_with;
use proxy_sieve::{run_aggregate, run_probe, AggregateConfig, AggregateReport, ProbeReport};

#[tokio::main]
async fn main() -> Result<()> {
    // Try the current directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    init_logger_with(cli.log_level.into(), cli.log_format).context("Failed to initialize logger")?;

    if let Err(e) = dispatch(cli.command).await {
        eprintln!("proxy_sieve error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Aggregate(args) => {
            let report = run_aggregate(AggregateConfig::from(args)).await?;
            print_aggregate(&report);
        }
        Command::Test(args) => {
            let report = run_probe(ProbeConfig::from(args)).await?;
            print_probe(&report);
        }
        Command::Refine { aggregate, test } => {
            let report = run_aggregate(AggregateConfig::from(aggregate)).await?;
            print_aggregate(&report);
            let report = run_probe(test.into_config(report.output_file)).await?;
            print_probe(&report);
        }
    }
    Ok(())
}

fn print_aggregate(report: &AggregateReport) {
    println!(
        "✅ Kept {} unique descriptor{} from {} source{} in {:.1}s",
        report.stats.unique,
        if report.stats.unique == 1 { "" } else { "s" },
        report.sources,
        if report.sources == 1 { "" } else { "s" },
        report.elapsed_seconds
    );
    println!("Records saved in {}", report.output_file.display());
}

fn print_probe(report: &ProbeReport) {
    println!(
        "✅ Tested {} descriptor{} ({} passed, {} failed) in {:.1}s",
        report.total,
        if report.total == 1 { "" } else { "s" },
        report.passed,
        report.failed,
        report.elapsed_seconds
    );
    if report.skipped_interrupted > 0 {
        println!(
            "⚠️  Interrupted: {} candidate{} left untested",
            report.skipped_interrupted,
            if report.skipped_interrupted == 1 { "" } else { "s" }
        );
    }
    println!("Results saved in {}", report.results_dir.display());
}
