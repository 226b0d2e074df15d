//! Progress logging utilities.

use log::info;

/// Logs how far the test stage has come.
///
/// # Arguments
///
/// * `start_time` - When the pool started
/// * `tested` - Candidates tested so far
/// * `total` - Candidates in the queue at start
/// * `passed` - Candidates that passed so far
pub fn log_progress(start_time: std::time::Instant, tested: usize, total: usize, passed: usize) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        tested as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Tested {}/{} candidates ({} passed) in {:.2} seconds (~{:.2} candidates/sec)",
        tested, total, passed, elapsed_secs, rate
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_log_progress_handles_zero_elapsed() {
        // Should not panic or divide by zero
        log_progress(Instant::now(), 0, 0, 0);
        log_progress(Instant::now(), 5, 10, 2);
    }
}
