//! Bounded worker pool.
//!
//! `N` workers drain one shared queue. Worker `i` owns local port `port_start + i`
//! for its whole life, so two sessions never share a port. Each worker keeps its own
//! [`RunStatistics`]; they are merged after every worker has finished.
//!
//! Cancelling the pool's token stops workers from pulling new candidates. Whatever
//! is still queued at that point is reported as skipped.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::candidate::{descriptor_prefix, CandidateTester};
use crate::app::log_progress;
use crate::descriptor::CanonicalRecord;
use crate::error_handling::{ErrorKind, InitializationError, RunStatistics};
use crate::probe::ProbeOutcome;

/// A record paired with the port it was tested on and its outcome.
#[derive(Debug, Clone)]
pub struct TestedRecord {
    pub record: CanonicalRecord,
    pub local_port: u16,
    pub outcome: ProbeOutcome,
}

/// Everything the pool produced: one entry per tested record, in input order.
#[derive(Debug, Default)]
pub struct TestRun {
    pub tested: Vec<TestedRecord>,
    pub stats: RunStatistics,
    /// Records left untested because the run was cancelled
    pub skipped: usize,
}

/// Pool sizing.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub concurrency: usize,
    pub port_start: u16,
    pub progress_interval: usize,
}

type Queue = Mutex<VecDeque<(usize, CanonicalRecord)>>;

/// Checks that `workers` consecutive ports starting at `port_start` all exist.
pub fn check_port_range(port_start: u16, workers: usize) -> Result<(), InitializationError> {
    if workers == 0 {
        return Err(InitializationError::InvalidConfigError(
            "concurrency must be at least 1".to_string(),
        ));
    }
    if port_start == 0 || usize::from(port_start) + workers - 1 > usize::from(u16::MAX) {
        return Err(InitializationError::PortRangeError {
            port_start,
            workers,
        });
    }
    Ok(())
}

/// Tests every record exactly once, or until `cancel` fires.
///
/// The pool never runs more workers than there are records.
///
/// # Errors
///
/// Fails before any candidate is tested if the port range is invalid or a worker
/// lane cannot be set up.
pub async fn run_pool<T: CandidateTester>(
    tester: Arc<T>,
    records: Vec<CanonicalRecord>,
    settings: PoolSettings,
    cancel: CancellationToken,
) -> Result<TestRun, InitializationError> {
    check_port_range(settings.port_start, settings.concurrency)?;

    let total = records.len();
    if total == 0 {
        return Ok(TestRun::default());
    }
    let workers = settings.concurrency.min(total);

    let mut lanes = Vec::with_capacity(workers);
    for i in 0..workers {
        // In range: checked above
        let port = settings.port_start + i as u16;
        lanes.push((port, tester.lane(port)?));
    }

    let queue: Arc<Queue> = Arc::new(Mutex::new(records.into_iter().enumerate().collect()));
    let tested_count = Arc::new(AtomicUsize::new(0));
    let passed_count = Arc::new(AtomicUsize::new(0));
    let start_time = Instant::now();
    let interval = settings.progress_interval.max(1);

    let mut tasks = FuturesUnordered::new();
    for (port, mut lane) in lanes {
        let tester = Arc::clone(&tester);
        let queue = Arc::clone(&queue);
        let tested_count = Arc::clone(&tested_count);
        let passed_count = Arc::clone(&passed_count);
        let cancel = cancel.clone();

        tasks.push(tokio::spawn(async move {
            let mut stats = RunStatistics::new();
            let mut results = Vec::new();

            while !cancel.is_cancelled() {
                let Some((index, record)) = pop(&queue) else {
                    break;
                };
                // A panicking candidate still gets its one outcome; the session it
                // held is dropped during unwinding, which kills the engine
                let outcome = match AssertUnwindSafe(tester.test(&mut lane, &record))
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(
                            "[port {}] test of {} panicked",
                            port,
                            descriptor_prefix(&record)
                        );
                        ProbeOutcome::failed(ErrorKind::XrayCrash)
                    }
                };
                debug!(
                    "[port {}] {} -> {}",
                    port,
                    descriptor_prefix(&record),
                    match outcome.error_kind {
                        None => format!("{} ms", outcome.delay_ms),
                        Some(kind) => kind.to_string(),
                    }
                );

                stats.record(&outcome);
                if outcome.success {
                    passed_count.fetch_add(1, Ordering::SeqCst);
                }
                let done = tested_count.fetch_add(1, Ordering::SeqCst) + 1;
                if done % interval == 0 || done == total {
                    log_progress(start_time, done, total, passed_count.load(Ordering::SeqCst));
                }

                results.push((
                    index,
                    TestedRecord {
                        record,
                        local_port: port,
                        outcome,
                    },
                ));
            }

            (stats, results)
        }));
    }

    let mut stats = RunStatistics::new();
    let mut indexed = Vec::with_capacity(total);
    while let Some(task_result) = tasks.next().await {
        match task_result {
            Ok((worker_stats, results)) => {
                stats.merge(worker_stats);
                indexed.extend(results);
            }
            Err(join_error) => warn!("Test worker panicked: {:?}", join_error),
        }
    }

    let skipped = remaining(&queue);
    if skipped > 0 {
        warn!("Run cancelled with {} candidates untested", skipped);
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(TestRun {
        tested: indexed.into_iter().map(|(_, tested)| tested).collect(),
        stats,
        skipped,
    })
}

fn pop(queue: &Queue) -> Option<(usize, CanonicalRecord)> {
    match queue.lock() {
        Ok(mut guard) => guard.pop_front(),
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}

fn remaining(queue: &Queue) -> usize {
    match queue.lock() {
        Ok(guard) => guard.len(),
        Err(poisoned) => poisoned.into_inner().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parse_descriptor;
    use std::collections::HashSet;
    use std::time::Duration;

    /// Fails odd ports' candidates with a timeout and tracks which ports are busy.
    #[derive(Default)]
    struct FakeTester {
        busy: Mutex<HashSet<u16>>,
        collisions: AtomicUsize,
        max_parallel: AtomicUsize,
    }

    impl CandidateTester for FakeTester {
        type Lane = u16;

        fn lane(&self, local_port: u16) -> Result<u16, InitializationError> {
            Ok(local_port)
        }

        async fn test(&self, lane: &mut u16, record: &CanonicalRecord) -> ProbeOutcome {
            {
                let mut busy = self.busy.lock().unwrap();
                if !busy.insert(*lane) {
                    self.collisions.fetch_add(1, Ordering::SeqCst);
                }
                self.max_parallel.fetch_max(busy.len(), Ordering::SeqCst);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.busy.lock().unwrap().remove(&*lane);

            if record.port() % 2 == 0 {
                ProbeOutcome::passed(i64::from(record.port()))
            } else {
                ProbeOutcome::failed(ErrorKind::Timeout)
            }
        }
    }

    fn records(count: u16) -> Vec<CanonicalRecord> {
        (1..=count)
            .map(|port| parse_descriptor(&format!("trojan://p@10.0.0.1:{port}")).unwrap())
            .collect()
    }

    fn settings(concurrency: usize) -> PoolSettings {
        PoolSettings {
            concurrency,
            port_start: 20_000,
            progress_interval: 10,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_record_tested_exactly_once() {
        let tester = Arc::new(FakeTester::default());
        let run = run_pool(
            Arc::clone(&tester),
            records(57),
            settings(8),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(run.tested.len(), 57);
        let ports: Vec<u16> = run.tested.iter().map(|t| t.record.port()).collect();
        assert_eq!(ports, (1..=57).collect::<Vec<_>>());

        assert_eq!(run.stats.total(), 57);
        assert_eq!(run.stats.passed(), 28);
        assert_eq!(run.stats.failure_count(ErrorKind::Timeout), 29);
        assert_eq!(tester.collisions.load(Ordering::SeqCst), 0);
        assert!(tester.max_parallel.load(Ordering::SeqCst) <= 8);
    }

    #[tokio::test]
    async fn test_worker_ports_stay_in_range() {
        let run = run_pool(
            Arc::new(FakeTester::default()),
            records(20),
            settings(4),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        let used: HashSet<u16> = run.tested.iter().map(|t| t.local_port).collect();
        assert!(used.iter().all(|p| (20_000..20_004).contains(p)));
    }

    #[tokio::test]
    async fn test_fewer_records_than_workers() {
        let run = run_pool(
            Arc::new(FakeTester::default()),
            records(3),
            settings(80),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(run.tested.len(), 3);
        assert!(run.tested.iter().all(|t| t.local_port < 20_003));
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let run = run_pool(
            Arc::new(FakeTester::default()),
            Vec::new(),
            settings(8),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(run.tested.is_empty());
        assert_eq!(run.stats.total(), 0);
    }

    /// Panics on the record whose server port is 7.
    struct PanickingTester;

    impl CandidateTester for PanickingTester {
        type Lane = ();

        fn lane(&self, _local_port: u16) -> Result<(), InitializationError> {
            Ok(())
        }

        async fn test(&self, _lane: &mut (), record: &CanonicalRecord) -> ProbeOutcome {
            if record.port() == 7 {
                panic!("tester blew up");
            }
            ProbeOutcome::passed(i64::from(record.port()))
        }
    }

    #[tokio::test]
    async fn test_panicking_candidate_keeps_every_outcome() {
        let run = run_pool(
            Arc::new(PanickingTester),
            records(10),
            settings(1),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(run.tested.len(), 10);
        assert_eq!(run.skipped, 0);
        assert_eq!(run.stats.total(), 10);
        assert_eq!(run.stats.passed(), 9);
        assert_eq!(run.stats.failure_count(ErrorKind::XrayCrash), 1);
        assert_eq!(
            run.tested[6].outcome,
            ProbeOutcome::failed(ErrorKind::XrayCrash)
        );
        assert_eq!(run.tested[7].outcome, ProbeOutcome::passed(8));
    }

    /// Cancels the run from inside the first test.
    struct CancellingTester(CancellationToken);

    impl CandidateTester for CancellingTester {
        type Lane = ();

        fn lane(&self, _local_port: u16) -> Result<(), InitializationError> {
            Ok(())
        }

        async fn test(&self, _lane: &mut (), _record: &CanonicalRecord) -> ProbeOutcome {
            self.0.cancel();
            ProbeOutcome::passed(1)
        }
    }

    #[tokio::test]
    async fn test_cancel_stops_pulling_new_records() {
        let cancel = CancellationToken::new();
        let tester = Arc::new(CancellingTester(cancel.clone()));
        let run = run_pool(tester, records(10), settings(1), cancel)
            .await
            .unwrap();
        assert_eq!(run.tested.len(), 1);
        assert_eq!(run.skipped, 9);
        assert_eq!(run.stats.total(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let run = run_pool(
            Arc::new(FakeTester::default()),
            records(5),
            settings(2),
            cancel,
        )
        .await
        .unwrap();
        assert!(run.tested.is_empty());
        assert_eq!(run.skipped, 5);
    }

    #[test]
    fn test_check_port_range() {
        assert!(check_port_range(10_000, 80).is_ok());
        assert!(check_port_range(65_535, 1).is_ok());
        assert!(matches!(
            check_port_range(65_500, 80),
            Err(InitializationError::PortRangeError { .. })
        ));
        assert!(matches!(
            check_port_range(10_000, 0),
            Err(InitializationError::InvalidConfigError(_))
        ));
    }
}
