//! Result ranking.

use serde::{Deserialize, Serialize};

use crate::error_handling::ErrorKind;
use crate::tester::TestedRecord;

/// One line of the detailed results document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Original descriptor string, unchanged
    pub descriptor: String,
    pub delay_ms: i64,
    pub error_kind: Option<ErrorKind>,
}

impl ReportEntry {
    pub fn passed(&self) -> bool {
        self.delay_ms != -1
    }
}

impl From<TestedRecord> for ReportEntry {
    fn from(tested: TestedRecord) -> Self {
        ReportEntry {
            descriptor: tested.record.raw_uri,
            delay_ms: tested.outcome.delay_ms,
            error_kind: tested.outcome.error_kind,
        }
    }
}

/// Ranked entries split into the passing and the failing part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    /// Ascending by latency
    pub passed: Vec<ReportEntry>,
    pub failed: Vec<ReportEntry>,
}

impl Ranking {
    /// All entries, fastest first, failures last.
    pub fn entries(&self) -> impl Iterator<Item = &ReportEntry> {
        self.passed.iter().chain(self.failed.iter())
    }

    pub fn len(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sorts entries by `delay_ms` ascending with the `-1` sentinel after every real
/// latency, then partitions them.
///
/// The sort is stable, so failures keep their input order.
pub fn rank<I>(entries: I) -> Ranking
where
    I: IntoIterator<Item = ReportEntry>,
{
    let mut entries: Vec<ReportEntry> = entries.into_iter().collect();
    entries.sort_by_key(|entry| {
        if entry.passed() {
            entry.delay_ms
        } else {
            i64::MAX
        }
    });

    let (passed, failed): (Vec<_>, Vec<_>) = entries.into_iter().partition(ReportEntry::passed);
    Ranking { passed, failed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(descriptor: &str, delay_ms: i64) -> ReportEntry {
        ReportEntry {
            descriptor: descriptor.to_string(),
            delay_ms,
            error_kind: (delay_ms == -1).then_some(ErrorKind::Timeout),
        }
    }

    #[test]
    fn test_failures_rank_last() {
        let ranking = rank([entry("a", 50), entry("b", -1), entry("c", 10)]);
        let delays: Vec<i64> = ranking.entries().map(|e| e.delay_ms).collect();
        assert_eq!(delays, [10, 50, -1]);
        assert_eq!(ranking.passed.len(), 2);
        assert_eq!(ranking.failed[0].descriptor, "b");
    }

    #[test]
    fn test_zero_latency_is_a_pass() {
        let ranking = rank([entry("slow", 900), entry("instant", 0)]);
        assert_eq!(ranking.passed[0].descriptor, "instant");
        assert!(ranking.failed.is_empty());
    }

    #[test]
    fn test_empty_ranking() {
        let ranking = rank(Vec::new());
        assert!(ranking.is_empty());
        assert_eq!(ranking.entries().count(), 0);
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_value(entry("vless://x", -1)).unwrap();
        assert_eq!(json["descriptor"], "vless://x");
        assert_eq!(json["delay_ms"], -1);
        assert_eq!(json["error_kind"], "Timeout");

        let json = serde_json::to_value(entry("vless://y", 12)).unwrap();
        assert!(json["error_kind"].is_null());
    }
}
