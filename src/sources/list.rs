//! Source-list file.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Reads the source URLs: one per line, blank lines and `#` comments skipped.
pub async fn read_source_urls(path: &Path) -> Result<Vec<String>> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open sources file: {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let mut urls = Vec::new();
    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("Failed to read sources file: {}", path.display()))?
    {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        urls.push(trimmed.to_string());
    }
    Ok(urls)
}
