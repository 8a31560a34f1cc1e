//! The PCA loop: the algorithmic heart of the core.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use dda_core::{
    action_log::ActionLog, free_worker_estimate, lifecycle, Computation, ComputeRequest,
    CoordinatorError, InstanceId, Logger, MessagingAdapter, Role, Tracker,
};

use crate::completion::Completion;
use crate::dispatch::spawn_dispatch;

/// Resubmit queue capacity. Overflow is a fail-fast condition.
const RESUBMIT_CAPACITY: usize = 100;

/// Apply one completion's effect on the loop's bookkeeping. Returns
/// `Some(reason)` if this completion triggers fail-fast.
fn apply_completion(
    completion: Completion,
    in_flight: &mut u64,
    action_log: &mut ActionLog,
    resubmit_queue: &mut VecDeque<bytes::Bytes>,
    computation: &mut dyn Computation,
) -> Option<String> {
    match completion {
        Completion::Success { log_id, worker_id, data } => {
            *in_flight -= 1;
            action_log.record_result(log_id, worker_id, data.clone());
            computation.accumulate(data);
            None
        }
        Completion::FatalComputational { log_id } => {
            *in_flight -= 1;
            action_log.record_error(log_id, "computational or encoding error");
            Some("computational error: worker returned an empty result".into())
        }
        Completion::Resubmit { log_id, original_input, cause } => {
            *in_flight -= 1;
            if resubmit_queue.len() >= RESUBMIT_CAPACITY {
                action_log.record_error(log_id, format!("resubmit queue full ({cause})"));
                return Some("resubmit queue overflow".into());
            }
            action_log.record_error(log_id, cause);
            resubmit_queue.push_back(original_input);
            None
        }
    }
}

/// How the PCA loop ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// `finalize` ran to completion; the request's result is in the sink.
    Finalized,
    /// The request was abandoned; a one-line failure was written to the
    /// sink instead of a result.
    FailFast(String),
    /// `partition` rejected the request's arguments; nothing was dispatched.
    ArgumentError(CoordinatorError),
}

/// One coordinator instance, servicing exactly one request over its
/// lifetime.
pub struct Coordinator {
    pub id: InstanceId,
    adapter: Arc<dyn MessagingAdapter>,
    tracker: Arc<Tracker>,
    logger: Logger,
}

impl Coordinator {
    /// Construct a coordinator and preregister its own id in the tracker —
    /// self must be tracked before any peer is.
    pub fn new(adapter: Arc<dyn MessagingAdapter>, logger: Logger) -> Self {
        let id = InstanceId::generate();
        let tracker = Arc::new(Tracker::new());
        tracker.try_join(Role::Coordinator, id.to_string());
        Self {
            id,
            adapter,
            tracker,
            logger,
        }
    }

    /// Run the full lifecycle for one request: track, announce, drive the
    /// PCA loop, finalize or fail fast, then leave.
    pub async fn run(
        &self,
        mut computation: Box<dyn Computation>,
        request: &ComputeRequest,
        sink: &mut dyn Write,
    ) -> RunOutcome {
        let start_time = Instant::now();
        let cancel = CancellationToken::new();

        // Subscriptions must be live before we announce, so that concurrent
        // joiners converge without a registry — the listener tasks are
        // spawned first.
        let responder = lifecycle::spawn_announce_responder(
            self.adapter.clone(),
            self.tracker.clone(),
            Role::Coordinator,
            self.id,
            cancel.clone(),
        );
        let worker_events = lifecycle::spawn_worker_event_listener(
            self.adapter.clone(),
            self.tracker.clone(),
            self.logger,
            cancel.clone(),
        );

        for (role, peer_id) in lifecycle::announce_join_coordinator(self.adapter.as_ref(), self.id).await
        {
            self.tracker.try_join(role, peer_id);
        }
        let (coordinators, workers) = self.tracker.count();
        self.logger
            .diag(format!("initial census: coordinators={coordinators} workers={workers}"));

        let outcome = match computation.partition(request) {
            Ok(inputs) => {
                self.pca_loop(computation.as_mut(), request, inputs, sink, start_time, &cancel)
                    .await
            }
            Err(err) => {
                // Argument errors print to the request's output sink, same
                // as a fail-fast message, not to a diagnostic channel — but
                // an unconditional error-level log is still warranted, same
                // as any other fatal/unexpected condition.
                self.logger.error(format!("argument error: {err}"));
                let _ = writeln!(sink, "FAIL: {err}");
                RunOutcome::ArgumentError(err)
            }
        };

        lifecycle::announce_leave(self.adapter.as_ref(), Role::Coordinator, self.id).await;
        tokio::time::sleep(lifecycle::LEAVE_GRACE).await;
        cancel.cancel();
        let _ = responder.await;
        let _ = worker_events.await;

        outcome
    }

    async fn pca_loop(
        &self,
        computation: &mut dyn Computation,
        request: &ComputeRequest,
        inputs: dda_core::PartitionIter,
        sink: &mut dyn Write,
        start_time: Instant,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let mut inputs = inputs.peekable();
        let mut resubmit_queue: VecDeque<bytes::Bytes> = VecDeque::new();
        let mut in_flight: u64 = 0;
        let mut next_log_id: u64 = 0;
        let mut action_log = ActionLog::new();
        let (completions_tx, mut completions_rx) = mpsc::unbounded_channel::<Completion>();
        let timeout = computation.partial_compute_timeout();

        let mut last_logged_state: Option<(usize, usize, u64)> = None;
        let mut fail_fast: Option<String> = None;

        'outer: loop {
            // Apply every completion already sitting in the channel before
            // considering a new dispatch. A burst of near-simultaneous
            // failures (e.g. a broker dropping everything) must be able to
            // pile onto the resubmit queue faster than slots get refilled,
            // or resubmit-queue overflow could never be observed.
            while let Ok(completion) = completions_rx.try_recv() {
                if let Some(reason) = apply_completion(
                    completion,
                    &mut in_flight,
                    &mut action_log,
                    &mut resubmit_queue,
                    computation,
                ) {
                    fail_fast = Some(reason);
                    break 'outer;
                }
            }

            if cancel.is_cancelled() {
                fail_fast = Some("canceled".into());
                break;
            }

            let (coordinators, workers) = self.tracker.count();
            let free = free_worker_estimate(coordinators, workers, in_flight);

            let state = (coordinators, workers, in_flight);
            if last_logged_state != Some(state) {
                self.logger.diag(format!(
                    "fleet state: coordinators={coordinators} workers={workers} in_flight={in_flight} free={free}"
                ));
                last_logged_state = Some(state);
            }

            if free > 0 {
                let next_input = resubmit_queue.pop_front().or_else(|| inputs.next());
                if let Some(input) = next_input {
                    next_log_id += 1;
                    in_flight += 1;
                    action_log.record_dispatch(next_log_id, request.name.clone(), input.clone());
                    spawn_dispatch(
                        self.adapter.clone(),
                        request.name.clone(),
                        self.id,
                        input,
                        timeout,
                        completions_tx.clone(),
                        next_log_id,
                        cancel.clone(),
                    );
                    continue;
                }
            }

            if inputs.peek().is_none() && resubmit_queue.is_empty() && in_flight == 0 {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    fail_fast = Some("canceled".into());
                    break;
                }
                completion = completions_rx.recv() => {
                    match completion {
                        Some(completion) => {
                            if let Some(reason) = apply_completion(
                                completion,
                                &mut in_flight,
                                &mut action_log,
                                &mut resubmit_queue,
                                computation,
                            ) {
                                fail_fast = Some(reason);
                                break;
                            }
                        }
                        None => {
                            fail_fast = Some("completion channel closed unexpectedly".into());
                            break;
                        }
                    }
                }
            }
        }

        self.logger.diag(format!("action log entries recorded: {}", action_log.len()));

        match fail_fast {
            Some(reason) => {
                self.logger.error(format!("fail-fast: {reason}"));
                let _ = writeln!(sink, "FAIL: {reason}");
                RunOutcome::FailFast(reason)
            }
            None => match computation.finalize(start_time, sink) {
                Ok(()) => RunOutcome::Finalized,
                Err(err) => {
                    let reason = format!("finalize failed: {err}");
                    self.logger.error(format!("fail-fast: {reason}"));
                    let _ = writeln!(sink, "FAIL: {reason}");
                    RunOutcome::FailFast(reason)
                }
            },
        }
    }
}
