//! Uniform API over the pub/sub substrate.
//!
//! Hides whether the substrate is reached in-process or via a sidecar over
//! RPC — the core only ever depends on [`MessagingAdapter`].

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{BoxStream, Stream};
use tokio_util::sync::CancellationToken;

use crate::envelope::{Action, ActionResult, Event, SubscriptionFilter};
use crate::error::{AdapterError, AdapterResult};

/// Uniform pub/sub surface the orchestration core calls into. Implementors
/// may reach an in-process broker or an out-of-process sidecar over RPC;
/// the core is agnostic to which.
#[async_trait]
pub trait MessagingAdapter: Send + Sync {
    /// Fire-and-forget publish. Fails only on substrate-level errors.
    async fn publish_event(&self, event: Event) -> AdapterResult<()>;

    /// Publish an action and return a lazy stream of correlated results,
    /// closed by end-of-stream, cancellation, or the given `deadline`.
    fn publish_action(&self, action: Action, deadline: Duration) -> ActionResultStream;

    /// Subscribe to one-shot events of the given filter.
    fn subscribe_event(&self, filter: SubscriptionFilter) -> BoxStream<'static, Event>;

    /// Subscribe to actions of the given filter. If `filter.share` is set,
    /// the substrate MUST deliver each matching action to exactly one
    /// subscriber among all subscribers sharing that group name.
    fn subscribe_action(&self, filter: SubscriptionFilter) -> BoxStream<'static, IncomingAction>;
}

/// An inbound action paired with the callback used to reply to it.
pub struct IncomingAction {
    pub action: Action,
    responder: ActionResponder,
}

impl IncomingAction {
    pub fn new(action: Action, responder: ActionResponder) -> Self {
        Self { action, responder }
    }

    /// Publish a correlated result for this action. May be called more than
    /// once per action (multi-result actions); the core itself only ever
    /// calls this once per partial-compute action.
    pub async fn reply(&self, result: ActionResult) -> AdapterResult<()> {
        self.responder.publish_action_result(result).await
    }
}

/// Implemented by a transport's per-correlation responder.
#[async_trait]
pub trait ActionResponderImpl: Send + Sync {
    async fn publish_action_result(&self, result: ActionResult) -> AdapterResult<()>;
}

/// Cloneable handle bound to one action's correlation id.
#[derive(Clone)]
pub struct ActionResponder(Arc<dyn ActionResponderImpl>);

impl ActionResponder {
    pub fn new(inner: Arc<dyn ActionResponderImpl>) -> Self {
        Self(inner)
    }

    async fn publish_action_result(&self, result: ActionResult) -> AdapterResult<()> {
        self.0.publish_action_result(result).await
    }
}

/// Stream of [`ActionResult`]s correlated to one published action.
///
/// Exposes both cancel and deadline controls: the deadline is baked in by
/// the adapter at publish time, cancellation is available via
/// [`ActionResultStream::cancel`]. A cancel surfaces exactly once, as a
/// terminal `Err(AdapterError::Canceled)`, the same way a deadline surfaces
/// as a terminal `Err(AdapterError::DeadlineExceeded)` — callers that care
/// only about "did this end early" can match on it; callers that just want
/// the stream to stop can drop it after the first `None`.
pub struct ActionResultStream {
    inner: Pin<Box<dyn Stream<Item = AdapterResult<ActionResult>> + Send>>,
    cancel: CancellationToken,
    canceled_emitted: bool,
}

impl ActionResultStream {
    pub fn new(
        inner: BoxStream<'static, AdapterResult<ActionResult>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner,
            cancel,
            canceled_emitted: false,
        }
    }

    /// Cancel the stream locally. The next poll yields
    /// `Err(AdapterError::Canceled)`, then `None` on every poll after.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for ActionResultStream {
    type Item = AdapterResult<ActionResult>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            if self.canceled_emitted {
                return Poll::Ready(None);
            }
            self.canceled_emitted = true;
            return Poll::Ready(Some(Err(AdapterError::Canceled)));
        }
        self.inner.as_mut().poll_next(cx)
    }
}
