//! The deduplicated record document and plain descriptor lists.
//!
//! The aggregate stage writes a JSON array of canonical records; the test stage reads
//! it back. The test stage also accepts a plain list with one descriptor per line.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;

use super::atomic::write_atomically;
use crate::dedup::{DescriptorStore, Fingerprint};
use crate::descriptor::{parse_descriptor, CanonicalRecord, Protocol};

/// Records read for the test stage, plus what had to be skipped.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    /// Unique records, in document order
    pub records: Vec<CanonicalRecord>,
    /// Entries that could not be turned into a record
    pub invalid: usize,
    /// Distinct entries naming a protocol other than the four supported ones
    pub unknown: usize,
    /// Entries dropped because an equivalent record came earlier
    pub duplicates: usize,
}

/// Writes `records` as a pretty-printed JSON array.
pub fn write_records(path: &Path, records: &[CanonicalRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records).context("Failed to serialize records")?;
    write_atomically(path, &json)
}

/// Reads a record document or, if the file is not a JSON array, a plain list.
pub fn load_records(path: &Path) -> Result<LoadedRecords> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    if text.trim_start().starts_with('[') {
        let documents: Vec<Value> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse record document: {}", path.display()))?;
        Ok(from_documents(documents))
    } else {
        Ok(from_descriptor_lines(&text))
    }
}

fn from_documents(documents: Vec<Value>) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();
    let mut store = DescriptorStore::new();
    let mut unknown = HashSet::new();

    for document in documents {
        let protocol = document
            .get("protocol")
            .and_then(Value::as_str)
            .and_then(|p| p.parse::<Protocol>().ok());
        if protocol.is_none() {
            unknown.insert(Fingerprint::of_document(&document));
            continue;
        }

        match serde_json::from_value::<CanonicalRecord>(document) {
            Ok(record) => {
                if !store.insert(record) {
                    loaded.duplicates += 1;
                }
            }
            Err(e) => {
                debug!("Skipping malformed record: {}", e);
                loaded.invalid += 1;
            }
        }
    }

    loaded.unknown = unknown.len();
    loaded.records = store.into_records();
    loaded
}

fn from_descriptor_lines(text: &str) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();
    let mut store = DescriptorStore::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_descriptor(line) {
            Ok(record) => {
                if !store.insert(record) {
                    loaded.duplicates += 1;
                }
            }
            Err(e) => {
                debug!("Skipping invalid descriptor: {}", e);
                loaded.invalid += 1;
            }
        }
    }

    loaded.records = store.into_records();
    loaded
}
