//! [`dda_core::MessagingAdapter`] implementation backed by [`crate::broker::Broker`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};
use tokio_util::sync::CancellationToken;

use dda_core::{
    Action, ActionResponder, ActionResponderImpl, ActionResult, ActionResultStream, AdapterError,
    AdapterResult, Event, IncomingAction, MessagingAdapter, SubscriptionFilter,
};

use crate::broker::Broker;

/// Handle onto the shared in-process broker. Cloning shares the same
/// underlying state — the substrate client must be shareable and
/// concurrency-safe across every coordinator/worker task that holds one.
#[derive(Clone)]
pub struct MemoryAdapter {
    broker: Arc<Broker>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self {
            broker: Arc::new(Broker::new()),
        }
    }

    /// Test/demo knob: make every publish of `kind` vanish without a trace,
    /// simulating a broker that drops all matching deliveries.
    pub fn blackhole(&self, kind: impl Into<String>) {
        self.broker.blackhole(kind);
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryResponder {
    broker: Arc<Broker>,
    correlation_id: u64,
}

#[async_trait]
impl ActionResponderImpl for MemoryResponder {
    async fn publish_action_result(&self, result: ActionResult) -> AdapterResult<()> {
        match self.broker.sender_for(self.correlation_id) {
            Some(sender) => sender
                .send(result)
                .await
                .map_err(|_| AdapterError::Transport("result channel closed".into())),
            None => Err(AdapterError::Transport(
                "correlation unknown (deadline likely already exceeded)".into(),
            )),
        }
    }
}

/// Drops the correlation bookkeeping once the result stream is no longer
/// needed, whatever the reason (exhausted, deadline, or cancel).
struct CorrelationGuard {
    broker: Arc<Broker>,
    correlation_id: u64,
}

impl Drop for CorrelationGuard {
    fn drop(&mut self) {
        self.broker.forget_correlation(self.correlation_id);
    }
}

#[async_trait]
impl MessagingAdapter for MemoryAdapter {
    async fn publish_event(&self, event: Event) -> AdapterResult<()> {
        self.broker.publish_event(event);
        Ok(())
    }

    fn publish_action(&self, action: Action, deadline: Duration) -> ActionResultStream {
        let correlation_id = self.broker.next_correlation_id();
        let (tx, rx) = mpsc::channel(64);
        self.broker.register_correlation(correlation_id, tx);
        self.broker.dispatch_action(action, correlation_id);

        let guard = CorrelationGuard {
            broker: self.broker.clone(),
            correlation_id,
        };
        let deadline_at = Instant::now() + deadline;

        let inner: BoxStream<'static, AdapterResult<ActionResult>> = futures::stream::unfold(
            (rx, guard, false),
            move |(mut rx, guard, timed_out)| async move {
                if timed_out {
                    return None;
                }
                let remaining = deadline_at.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Some((Err(AdapterError::DeadlineExceeded), (rx, guard, true)));
                }
                match tokio::time::timeout(remaining, rx.recv()).await {
                    Ok(Some(item)) => Some((Ok(item), (rx, guard, false))),
                    Ok(None) => None,
                    Err(_elapsed) => Some((Err(AdapterError::DeadlineExceeded), (rx, guard, true))),
                }
            },
        )
        .boxed();

        ActionResultStream::new(inner, CancellationToken::new())
    }

    fn subscribe_event(&self, filter: SubscriptionFilter) -> BoxStream<'static, Event> {
        let rx = self.broker.subscribe_event(&filter.kind);
        BroadcastStream::new(rx)
            .filter_map(|item| async move { item.ok() })
            .boxed()
    }

    fn subscribe_action(&self, filter: SubscriptionFilter) -> BoxStream<'static, IncomingAction> {
        let rx = self
            .broker
            .subscribe_action(&filter.kind, filter.share.as_deref());
        let broker = self.broker.clone();
        UnboundedReceiverStream::new(rx)
            .map(move |routed| {
                let responder = ActionResponder::new(Arc::new(MemoryResponder {
                    broker: broker.clone(),
                    correlation_id: routed.correlation_id,
                }));
                IncomingAction::new(routed.action, responder)
            })
            .boxed()
    }
}
