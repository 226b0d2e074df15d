//! Result files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use super::rank::Ranking;
use crate::config::{DETAILED_RESULTS_FILE, PASSED_DESCRIPTORS_FILE};
use crate::storage::write_atomically;

/// Paths of the files written for one test run.
#[derive(Debug, Clone)]
pub struct ResultFiles {
    pub directory: PathBuf,
    pub detailed: PathBuf,
    pub passed: PathBuf,
}

/// Creates `<results_root>/<YYYY-mm-dd_HH-MM-SS>/` and writes the ranked results
/// into it.
///
/// A run starting in the same second as an earlier one gets a `_1`, `_2`, ...
/// suffix instead of sharing its directory.
///
/// `detailed_results.json` holds every entry in rank order;
/// `real_delay_passed.txt` holds the passing descriptors, fastest first, one per
/// line. Each file is written to a temporary file and renamed into place.
pub fn write_results(results_root: &Path, ranking: &Ranking) -> Result<ResultFiles> {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let directory = create_run_directory(results_root, &stamp)?;

    let entries: Vec<_> = ranking.entries().collect();
    let detailed_json =
        serde_json::to_vec_pretty(&entries).context("Failed to serialize detailed results")?;
    let detailed = directory.join(DETAILED_RESULTS_FILE);
    write_atomically(&detailed, &detailed_json)?;

    let mut passed_text = String::new();
    for entry in &ranking.passed {
        passed_text.push_str(&entry.descriptor);
        passed_text.push('\n');
    }
    let passed = directory.join(PASSED_DESCRIPTORS_FILE);
    write_atomically(&passed, passed_text.as_bytes())?;

    Ok(ResultFiles {
        directory,
        detailed,
        passed,
    })
}

/// Creates a fresh directory named `stamp`, or `stamp_<n>` if that name is taken.
fn create_run_directory(results_root: &Path, stamp: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(results_root).with_context(|| {
        format!(
            "Failed to create results directory: {}",
            results_root.display()
        )
    })?;

    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            stamp.to_string()
        } else {
            format!("{stamp}_{suffix}")
        };
        let directory = results_root.join(name);
        match std::fs::create_dir(&directory) {
            Ok(()) => return Ok(directory),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Failed to create results directory: {}",
                        directory.display()
                    )
                })
            }
        }
    }
}
