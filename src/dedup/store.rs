//! First-wins descriptor store.

use std::collections::HashSet;

use super::fingerprint::Fingerprint;
use crate::descriptor::CanonicalRecord;

/// Position of a descriptor in the combined source text: `(source index, line index)`.
///
/// Records parsed out of order (one task per source) are ordered by this key before
/// insertion, so the record that wins a duplicate is always the one that appears
/// first in source order.
pub type SequenceKey = (usize, usize);

/// Deduplicated records in insertion order.
#[derive(Debug, Default)]
pub struct DescriptorStore {
    seen: HashSet<Fingerprint>,
    records: Vec<CanonicalRecord>,
}

impl DescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` unless one with the same fingerprint is already present.
    ///
    /// Returns `true` when the record was kept.
    pub fn insert(&mut self, record: CanonicalRecord) -> bool {
        if self.seen.insert(Fingerprint::of(&record)) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    /// Inserts records collected in any order, resolving ties by [`SequenceKey`].
    ///
    /// Returns the number of records dropped as duplicates.
    pub fn extend_sequenced<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = (SequenceKey, CanonicalRecord)>,
    {
        let mut records: Vec<_> = records.into_iter().collect();
        records.sort_by_key(|(key, _)| *key);

        let mut duplicates = 0;
        for (_, record) in records {
            if !self.insert(record) {
                duplicates += 1;
            }
        }
        duplicates
    }

    pub fn contains(&self, record: &CanonicalRecord) -> bool {
        self.seen.contains(&Fingerprint::of(record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }
}
