//! Run statistics.
//!
//! Workers keep their own `RunStatistics` and the pool merges them once every
//! worker has finished, so no counter is shared while candidates are being tested.

use std::collections::BTreeMap;

use super::types::{ErrorKind, ParseFailureKind};
use crate::descriptor::Protocol;
use crate::probe::ProbeOutcome;

/// Outcome counters of the test stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    total: usize,
    passed: usize,
    failures: BTreeMap<ErrorKind, usize>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one tested candidate.
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.total += 1;
        match outcome.error_kind {
            None => self.passed += 1,
            Some(kind) => *self.failures.entry(kind).or_insert(0) += 1,
        }
    }

    /// Folds another worker's counters into this one.
    pub fn merge(&mut self, other: RunStatistics) {
        self.total += other.total;
        self.passed += other.passed;
        for (kind, count) in other.failures {
            *self.failures.entry(kind).or_insert(0) += count;
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    pub fn failure_count(&self, kind: ErrorKind) -> usize {
        self.failures.get(&kind).copied().unwrap_or(0)
    }

    /// Failure kinds with their counts, in a stable order.
    pub fn failures(&self) -> impl Iterator<Item = (ErrorKind, usize)> + '_ {
        self.failures.iter().map(|(kind, count)| (*kind, *count))
    }
}

/// Counters of the aggregate stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseStatistics {
    /// Candidate lines handed to the parser
    pub candidates: usize,
    /// Records kept after deduplication
    pub unique: usize,
    /// Parsed records dropped as duplicates
    pub duplicates: usize,
    parsed: BTreeMap<Protocol, usize>,
    failures: BTreeMap<ParseFailureKind, usize>,
}

impl ParseStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_parsed(&mut self, protocol: Protocol) {
        *self.parsed.entry(protocol).or_insert(0) += 1;
    }

    pub fn record_failure(&mut self, kind: ParseFailureKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    pub fn parsed_count(&self, protocol: Protocol) -> usize {
        self.parsed.get(&protocol).copied().unwrap_or(0)
    }

    pub fn failure_count(&self, kind: ParseFailureKind) -> usize {
        self.failures.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_parsed(&self) -> usize {
        self.parsed.values().sum()
    }

    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }

    pub fn parsed(&self) -> impl Iterator<Item = (Protocol, usize)> + '_ {
        self.parsed.iter().map(|(p, c)| (*p, *c))
    }

    pub fn failures(&self) -> impl Iterator<Item = (ParseFailureKind, usize)> + '_ {
        self.failures.iter().map(|(k, c)| (*k, *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_passes_and_failures() {
        let mut stats = RunStatistics::new();
        stats.record(&ProbeOutcome::passed(120));
        stats.record(&ProbeOutcome::failed(ErrorKind::TcpFailed));
        stats.record(&ProbeOutcome::failed(ErrorKind::TcpFailed));
        stats.record(&ProbeOutcome::failed(ErrorKind::HttpStatus(403)));

        assert_eq!(stats.total(), 4);
        assert_eq!(stats.passed(), 1);
        assert_eq!(stats.failed(), 3);
        assert_eq!(stats.failure_count(ErrorKind::TcpFailed), 2);
        assert_eq!(stats.failure_count(ErrorKind::HttpStatus(403)), 1);
        assert_eq!(stats.failure_count(ErrorKind::Timeout), 0);
    }

    #[test]
    fn test_merge_adds_worker_counters() {
        let mut a = RunStatistics::new();
        a.record(&ProbeOutcome::passed(10));
        a.record(&ProbeOutcome::failed(ErrorKind::Timeout));

        let mut b = RunStatistics::new();
        b.record(&ProbeOutcome::failed(ErrorKind::Timeout));
        b.record(&ProbeOutcome::failed(ErrorKind::XrayCrash));

        a.merge(b);
        assert_eq!(a.total(), 4);
        assert_eq!(a.passed(), 1);
        assert_eq!(a.failure_count(ErrorKind::Timeout), 2);
        assert_eq!(a.failure_count(ErrorKind::XrayCrash), 1);
    }

    #[test]
    fn test_parse_statistics_totals() {
        let mut stats = ParseStatistics::new();
        stats.record_parsed(Protocol::Vless);
        stats.record_parsed(Protocol::Vless);
        stats.record_parsed(Protocol::Shadowsocks);
        stats.record_failure(ParseFailureKind::MissingPort);

        assert_eq!(stats.total_parsed(), 3);
        assert_eq!(stats.parsed_count(Protocol::Vless), 2);
        assert_eq!(stats.total_failures(), 1);
        assert_eq!(stats.failure_count(ParseFailureKind::MissingPort), 1);
    }
}
