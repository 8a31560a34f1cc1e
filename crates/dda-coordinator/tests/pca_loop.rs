//! End-to-end PCA loop scenarios exercised against the in-process adapter:
//! a factorial smoke run, a defecting worker that gets resubmitted, a fatal
//! computational error, a resubmit-queue overflow, and the zero-input case.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use dda_computations::Factorial;
use dda_core::{
    lifecycle, ActionResult, Computation, ComputeRequest, CoordinatorError, InstanceId, Logger,
    MessagingAdapter, PartitionIter, SubscriptionFilter, PCOMP_SHARE, PCOMP_TYPE,
};
use dda_coordinator::{Coordinator, RunOutcome};
use dda_transport_memory::MemoryAdapter;

/// Subscribes to the shared `pcomp` group and announces as a worker. Echoes
/// every partial back, except it silently declines the `decline_on`th
/// action it receives (1-indexed) and replies with empty data on the
/// `fail_on`th (also 1-indexed), simulating defection / a fatal
/// computational error respectively.
fn spawn_fake_worker(adapter: Arc<dyn MessagingAdapter>, decline_on: Option<usize>, fail_on: Option<usize>) {
    tokio::spawn(async move {
        let worker_id = InstanceId::generate();
        let mut incoming = adapter.subscribe_action(SubscriptionFilter::shared(PCOMP_TYPE, PCOMP_SHARE));
        lifecycle::announce_join_worker(adapter.as_ref(), worker_id).await;

        let mut seen: usize = 0;
        while let Some(job) = incoming.next().await {
            seen += 1;
            if Some(seen) == decline_on {
                continue; // decline: no reply at all
            }
            let data = if Some(seen) == fail_on {
                Bytes::new()
            } else {
                job.action.params.clone()
            };
            let _ = job.reply(ActionResult::new(worker_id.to_string(), data)).await;
        }
    });
}

#[tokio::test]
async fn factorial_smoke_with_two_workers() {
    let adapter: Arc<dyn MessagingAdapter> = Arc::new(MemoryAdapter::new());
    spawn_fake_worker(adapter.clone(), None, None);
    spawn_fake_worker(adapter.clone(), None, None);

    let coordinator = Coordinator::new(adapter, Logger::new(false));
    let request = ComputeRequest::new("fac", vec!["5".into()]);
    let mut sink = Cursor::new(Vec::new());

    let outcome = coordinator.run(Box::new(Factorial::new()), &request, &mut sink).await;

    assert!(matches!(outcome, RunOutcome::Finalized));
    assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "120\n");
}

#[tokio::test(start_paused = true)]
async fn worker_defection_is_resubmitted_to_completion() {
    let adapter: Arc<dyn MessagingAdapter> = Arc::new(MemoryAdapter::new());
    // Declines its 2nd delivery once, then behaves normally (including on
    // the resubmitted retry of that same input).
    spawn_fake_worker(adapter.clone(), Some(2), None);

    let coordinator = Coordinator::new(adapter, Logger::new(false));
    let request = ComputeRequest::new("fac", vec!["5".into()]);
    let mut sink = Cursor::new(Vec::new());

    let outcome = coordinator.run(Box::new(Factorial::new()), &request, &mut sink).await;

    assert!(matches!(outcome, RunOutcome::Finalized));
    assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "120\n");
}

#[tokio::test]
async fn fatal_computational_error_fails_fast_without_finalizing() {
    let adapter: Arc<dyn MessagingAdapter> = Arc::new(MemoryAdapter::new());
    // Fails outright on its 2nd delivery; partition("4") emits 3 inputs.
    spawn_fake_worker(adapter.clone(), None, Some(2));

    let coordinator = Coordinator::new(adapter, Logger::new(false));
    let request = ComputeRequest::new("fac", vec!["4".into()]);
    let mut sink = Cursor::new(Vec::new());

    let outcome = coordinator.run(Box::new(Factorial::new()), &request, &mut sink).await;

    match outcome {
        RunOutcome::FailFast(reason) => assert!(reason.contains("computational error")),
        other => panic!("expected fail-fast, got {other:?}"),
    }
    let output = String::from_utf8(sink.into_inner()).unwrap();
    assert!(output.starts_with("FAIL:"));
}

#[tokio::test]
async fn input_n_zero_finalizes_immediately() {
    let adapter: Arc<dyn MessagingAdapter> = Arc::new(MemoryAdapter::new());
    let coordinator = Coordinator::new(adapter, Logger::new(false));
    let request = ComputeRequest::new("fac", vec!["0".into()]);
    let mut sink = Cursor::new(Vec::new());

    let outcome = coordinator.run(Box::new(Factorial::new()), &request, &mut sink).await;

    assert!(matches!(outcome, RunOutcome::Finalized));
    assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "1\n");
}

#[tokio::test]
async fn argument_error_is_written_to_the_output_sink_not_just_surfaced_in_process() {
    let adapter: Arc<dyn MessagingAdapter> = Arc::new(MemoryAdapter::new());
    let coordinator = Coordinator::new(adapter, Logger::new(false));
    let request = ComputeRequest::new("fac", vec!["banana".into()]);
    let mut sink = Cursor::new(Vec::new());

    let outcome = coordinator.run(Box::new(Factorial::new()), &request, &mut sink).await;

    assert!(matches!(outcome, RunOutcome::ArgumentError(_)));
    let output = String::from_utf8(sink.into_inner()).unwrap();
    assert!(output.starts_with("FAIL:"), "expected a FAIL line in the output sink, got {output:?}");
}

/// Minimal computation with a short timeout, used only to keep the
/// resubmit-overflow test fast: `Factorial`'s 5s timeout would make the
/// same scenario correct but slow even under paused time.
struct OverflowProbe {
    count: usize,
}

#[async_trait]
impl Computation for OverflowProbe {
    fn name(&self) -> &str {
        "overflow-probe"
    }
    fn description(&self) -> &str {
        "emits N placeholder inputs with a short per-partial timeout"
    }
    fn partition(&self, request: &ComputeRequest) -> Result<PartitionIter, CoordinatorError> {
        let n: usize = request.args[0].parse().unwrap();
        Ok(Box::new((0..n).map(|i| Bytes::from(i.to_string()))))
    }
    async fn partial_compute(&self, input: Bytes) -> Option<Bytes> {
        Some(input)
    }
    fn partial_compute_timeout(&self) -> Duration {
        Duration::from_millis(5)
    }
    fn accumulate(&mut self, _output: Bytes) {
        self.count += 1;
    }
    fn finalize(&mut self, _start_time: std::time::Instant, sink: &mut dyn std::io::Write) -> std::io::Result<()> {
        writeln!(sink, "{}", self.count)
    }
}

#[tokio::test(start_paused = true)]
async fn resubmit_overflow_fails_fast_with_no_deadlock() {
    let memory = MemoryAdapter::new();
    memory.blackhole(PCOMP_TYPE);
    let adapter: Arc<dyn MessagingAdapter> = Arc::new(memory);

    // A large worker count gives the rate limiter enough free budget to
    // dispatch every input essentially at once, so their timeouts land in
    // one burst and genuinely pile onto the resubmit queue.
    // The coordinator's own worker-event listener only starts subscribing
    // once its task is first polled, which happens concurrently with these.
    // A short sleep (instant under the paused clock, but still a real yield
    // point) lets that listener reach its subscribe call first, so these
    // announcements aren't published into an empty broadcast channel and
    // lost before anyone is listening.
    let joined = Arc::new(AtomicUsize::new(0));
    for _ in 0..200 {
        let adapter = adapter.clone();
        let joined = joined.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            let worker_id = InstanceId::generate();
            lifecycle::announce_join_worker(adapter.as_ref(), worker_id).await;
            joined.fetch_add(1, Ordering::SeqCst);
        });
    }
    tokio::time::sleep(Duration::from_millis(5)).await;

    let coordinator = Coordinator::new(adapter, Logger::new(false));
    let request = ComputeRequest::new("overflow-probe", vec!["200".into()]);
    let mut sink = Cursor::new(Vec::new());
    let computation = Box::new(OverflowProbe { count: 0 });

    let outcome = coordinator.run(computation, &request, &mut sink).await;

    match outcome {
        RunOutcome::FailFast(reason) => assert!(reason.contains("overflow")),
        other => panic!("expected resubmit overflow fail-fast, got {other:?}"),
    }
}
