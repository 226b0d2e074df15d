//! Summary printing for both stages.

use log::info;

use crate::error_handling::{ParseStatistics, RunStatistics};

/// Prints what the aggregate stage parsed, dropped and kept.
pub fn print_parse_statistics(stats: &ParseStatistics) {
    info!(
        "Parsed {} of {} candidate line{} ({} unique, {} duplicate{})",
        stats.total_parsed(),
        stats.candidates,
        if stats.candidates == 1 { "" } else { "s" },
        stats.unique,
        stats.duplicates,
        if stats.duplicates == 1 { "" } else { "s" },
    );

    for (protocol, count) in stats.parsed() {
        info!("   {}: {}", protocol, count);
    }

    let total_failures = stats.total_failures();
    if total_failures > 0 {
        info!("Parse Failures ({} total):", total_failures);
        for (kind, count) in stats.failures() {
            info!("   {}: {}", kind.as_ref(), count);
        }
    }
}

/// Prints the test-stage totals with failures broken down by kind.
pub fn print_run_statistics(stats: &RunStatistics, elapsed_seconds: f64) {
    info!(
        "✅ Tested {} candidate{} ({} passed, {} failed) in {:.1}s",
        stats.total(),
        if stats.total() == 1 { "" } else { "s" },
        stats.passed(),
        stats.failed(),
        elapsed_seconds
    );

    if stats.failed() > 0 {
        info!("Failure Counts ({} total):", stats.failed());
        for (kind, count) in stats.failures() {
            info!("   {}: {}", kind, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Protocol;
    use crate::error_handling::{ErrorKind, ParseFailureKind};
    use crate::probe::ProbeOutcome;

    #[test]
    fn test_print_parse_statistics() {
        let mut stats = ParseStatistics::new();
        // Should not panic on empty counters
        print_parse_statistics(&stats);

        stats.candidates = 3;
        stats.record_parsed(Protocol::Trojan);
        stats.record_failure(ParseFailureKind::MissingPort);
        print_parse_statistics(&stats);
    }

    #[test]
    fn test_print_run_statistics() {
        let mut stats = RunStatistics::new();
        print_run_statistics(&stats, 0.0);

        stats.record(&ProbeOutcome::passed(10));
        stats.record(&ProbeOutcome::failed(ErrorKind::XrayCrash));
        print_run_statistics(&stats, 1.5);
    }
}
