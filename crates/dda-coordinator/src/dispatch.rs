//! Per-partial dispatch helper task.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use dda_core::{Action, AdapterError, InstanceId, MessagingAdapter, PCOMP_TYPE};

use crate::completion::Completion;

/// Publish one `pcomp` action and await exactly one correlated result,
/// translating it into a [`Completion`] the PCA loop understands. Cancelled
/// dispatches are silent — the parent loop observes the same cancellation
/// directly and fails fast on its own.
#[instrument(skip(adapter, completions, input), fields(log_id))]
#[allow(clippy::too_many_arguments)]
pub fn spawn_dispatch(
    adapter: Arc<dyn MessagingAdapter>,
    computation_name: String,
    self_id: InstanceId,
    input: Bytes,
    timeout: Duration,
    completions: mpsc::UnboundedSender<Completion>,
    log_id: u64,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let action = Action {
            kind: PCOMP_TYPE.to_string(),
            id: computation_name,
            source: self_id.to_string(),
            params: input.clone(),
        };

        let mut stream = adapter.publish_action(action, timeout);
        let item = tokio::select! {
            _ = cancel.cancelled() => {
                // Cancel the stream explicitly rather than just dropping it,
                // so the adapter surfaces its own Canceled terminal error on
                // the next poll — that's what actually reaches the match
                // below as the "silent, no completion" case, instead of
                // falling through to the generic stream-closed branch.
                stream.cancel();
                stream.next().await
            }
            item = stream.next() => item,
        };

        let completion = match item {
            Some(Ok(result)) if result.data.is_empty() => Some(Completion::FatalComputational { log_id }),
            Some(Ok(result)) => Some(Completion::Success {
                log_id,
                worker_id: result.context,
                data: result.data,
            }),
            Some(Err(AdapterError::Canceled)) => None,
            Some(Err(AdapterError::DeadlineExceeded)) => Some(Completion::Resubmit {
                log_id,
                original_input: input,
                cause: "deadline exceeded".into(),
            }),
            Some(Err(AdapterError::Transport(err))) => Some(Completion::Resubmit {
                log_id,
                original_input: input,
                cause: err,
            }),
            // The stream closed without yielding anything. Our own adapters
            // never do this, but a future substrate-backed adapter might;
            // treat it the same as a timeout rather than leaking in_flight.
            None => Some(Completion::Resubmit {
                log_id,
                original_input: input,
                cause: "result stream closed with no reply".into(),
            }),
        };

        if let Some(completion) = completion {
            let _ = completions.send(completion);
        }
    });
}
