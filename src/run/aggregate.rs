//! The aggregate stage: sources file to deduplicated record document.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use crate::app::print_parse_statistics;
use crate::config::AggregateConfig;
use crate::dedup::{DescriptorStore, SequenceKey};
use crate::descriptor::{parse_descriptor, CanonicalRecord};
use crate::error_handling::ParseStatistics;
use crate::initialization::init_source_client;
use crate::sources::{fetch_all, read_source_urls, CandidateExtractor};
use crate::storage::write_records;

/// Results of an aggregate run.
#[derive(Debug, Clone)]
pub struct AggregateReport {
    /// Source URLs read from the sources file
    pub sources: usize,
    /// Parse and dedup counters
    pub stats: ParseStatistics,
    /// Where the record document was written
    pub output_file: PathBuf,
    pub elapsed_seconds: f64,
}

/// Fetches every source, extracts and parses candidate descriptors, deduplicates
/// them and writes the record document.
///
/// # Errors
///
/// Fails if the sources file cannot be read or lists no source, if the HTTP client
/// cannot be built, or if the record document cannot be written. Individual sources
/// that fail to download only contribute nothing.
pub async fn run_aggregate(config: AggregateConfig) -> Result<AggregateReport> {
    let start_time = Instant::now();

    let urls = read_source_urls(&config.sources_file).await?;
    if urls.is_empty() {
        bail!("No sources found in {}", config.sources_file.display());
    }
    info!("Fetching {} sources...", urls.len());

    let client =
        init_source_client(config.fetch_timeout).context("Failed to initialize HTTP client")?;
    let bodies = fetch_all(&client, &urls).await;

    let extractor = CandidateExtractor::new().context("Failed to compile descriptor pattern")?;
    let mut stats = ParseStatistics::new();
    let sequenced = parse_bodies(&extractor, &bodies, &mut stats);
    info!("Processed {} potential descriptor lines", stats.candidates);

    let mut store = DescriptorStore::new();
    stats.duplicates = store.extend_sequenced(sequenced);
    stats.unique = store.len();
    if store.is_empty() {
        warn!("No valid descriptors found; writing an empty record document");
    }

    write_records(&config.output_file, store.records()).with_context(|| {
        format!(
            "Failed to write record document: {}",
            config.output_file.display()
        )
    })?;

    print_parse_statistics(&stats);
    info!(
        "Saved {} unique records to {}",
        stats.unique,
        config.output_file.display()
    );

    Ok(AggregateReport {
        sources: urls.len(),
        stats,
        output_file: config.output_file,
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
    })
}

/// Parses every candidate line, tagging each record with its position.
fn parse_bodies(
    extractor: &CandidateExtractor,
    bodies: &[String],
    stats: &mut ParseStatistics,
) -> Vec<(SequenceKey, CanonicalRecord)> {
    let mut sequenced = Vec::new();
    for (source_idx, body) in bodies.iter().enumerate() {
        for (line_idx, candidate) in extractor.extract(body).into_iter().enumerate() {
            stats.candidates += 1;
            match parse_descriptor(&candidate) {
                Ok(record) => {
                    stats.record_parsed(record.protocol());
                    sequenced.push(((source_idx, line_idx), record));
                }
                Err(e) => {
                    log::debug!("Dropping candidate from source {}: {}", source_idx, e);
                    stats.record_failure(e.kind());
                }
            }
        }
    }
    sequenced
}
