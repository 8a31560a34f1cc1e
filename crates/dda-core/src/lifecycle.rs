//! The symmetric lifecycle announcement protocol.
//!
//! Shared, free-function implementation used verbatim by both the
//! coordinator and the worker, consolidated here rather than kept as two
//! divergent copies.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::diagnostics::Logger;
use crate::envelope::{Action, ActionResult, Event, SubscriptionFilter};
use crate::ids::{InstanceId, Role};
use crate::messaging::MessagingAdapter;
use crate::tracker::Tracker;

/// Action type coordinators announce on; responders reply via action-result.
pub const ANNOUNCE_COORDINATOR_TYPE: &str = "ddaexmpls.compute.announceCoordinator";
/// Event type workers announce on; no reply.
pub const ANNOUNCE_WORKER_TYPE: &str = "ddaexmpls.compute.announceWorker";

const HELLO: &[u8] = b"HELLO";
const BYE: &[u8] = b"BYE";

/// Grace delay after publishing a leave announcement, before the transport
/// is closed, so the broker has a chance to forward it.
pub const LEAVE_GRACE: Duration = Duration::from_millis(500);

const JOIN_CENSUS_DEADLINE: Duration = Duration::from_secs(2);

/// Publish an `announceCoordinator` "HELLO" action and collect the
/// `(role, id)` of every peer that replies before the census deadline. No
/// error is surfaced on deadline or cancel — the set built so far is the
/// initial census. Callers are expected to have already subscribed (via
/// [`spawn_announce_responder`] and, for coordinators,
/// [`spawn_worker_event_listener`]) before calling this, so concurrently
/// joining peers converge without requiring a registry.
#[instrument(skip(adapter))]
pub async fn announce_join_coordinator(
    adapter: &dyn MessagingAdapter,
    self_id: InstanceId,
) -> Vec<(Role, String)> {
    let action = Action {
        kind: ANNOUNCE_COORDINATOR_TYPE.to_string(),
        id: self_id.to_string(),
        source: self_id.to_string(),
        params: Bytes::from_static(HELLO),
    };

    let mut stream = adapter.publish_action(action, JOIN_CENSUS_DEADLINE);
    let mut peers = Vec::new();
    while let Some(item) = stream.next().await {
        if let Ok(result) = item {
            if let Some(peer) = parse_peer(&result) {
                peers.push(peer);
            }
        }
    }
    peers
}

fn parse_peer(result: &ActionResult) -> Option<(Role, String)> {
    let role: Role = result.context.parse().ok()?;
    let id = String::from_utf8(result.data.to_vec()).ok()?;
    Some((role, id))
}

/// Publish an `announceWorker` "HELLO" event.
#[instrument(skip(adapter))]
pub async fn announce_join_worker(adapter: &dyn MessagingAdapter, self_id: InstanceId) {
    let event = Event {
        kind: ANNOUNCE_WORKER_TYPE.to_string(),
        id: self_id.to_string(),
        source: self_id.to_string(),
        data: Bytes::from_static(HELLO),
    };
    if let Err(err) = adapter.publish_event(event).await {
        debug!(%err, "announceWorker HELLO publish failed, continuing without census reach");
    }
}

/// Publish a leave announcement for `role`. Callers MUST still wait
/// [`LEAVE_GRACE`] before closing the transport.
#[instrument(skip(adapter))]
pub async fn announce_leave(adapter: &dyn MessagingAdapter, role: Role, self_id: InstanceId) {
    match role {
        Role::Coordinator => {
            let action = Action {
                kind: ANNOUNCE_COORDINATOR_TYPE.to_string(),
                id: self_id.to_string(),
                source: self_id.to_string(),
                params: Bytes::from_static(BYE),
            };
            // No reply expected; a short local deadline is acceptable.
            let mut stream = adapter.publish_action(action, Duration::from_millis(200));
            while stream.next().await.is_some() {}
        }
        Role::Worker => {
            let event = Event {
                kind: ANNOUNCE_WORKER_TYPE.to_string(),
                id: self_id.to_string(),
                source: self_id.to_string(),
                data: Bytes::from_static(BYE),
            };
            let _ = adapter.publish_event(event).await;
        }
    }
}

/// Spawn the background task that makes this instance respond to peers'
/// `announceCoordinator` actions: HELLO joins get tracked plus one reply;
/// BYE announcements untrack the source with no reply; an echo of one's own
/// announcement is always ignored.
pub fn spawn_announce_responder(
    adapter: Arc<dyn MessagingAdapter>,
    tracker: Arc<Tracker>,
    self_role: Role,
    self_id: InstanceId,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut incoming =
            adapter.subscribe_action(SubscriptionFilter::new(ANNOUNCE_COORDINATOR_TYPE));
        loop {
            let incoming_action = tokio::select! {
                _ = cancel.cancelled() => break,
                item = incoming.next() => match item {
                    Some(item) => item,
                    None => break,
                },
            };

            let source = incoming_action.action.source.clone();
            if source == self_id.to_string() {
                continue; // never reply to, or track, our own announcement
            }

            if incoming_action.action.params.as_ref() == HELLO {
                // Only coordinators publish announceCoordinator, so the
                // source is always tracked as a coordinator here.
                tracker.try_join(Role::Coordinator, source);
                let reply = ActionResult::new(self_role.to_string(), Bytes::from(self_id.to_string()));
                let _ = incoming_action.reply(reply).await;
            } else if incoming_action.action.params.as_ref() == BYE {
                tracker.leave(Role::Coordinator, source);
            }
        }
    })
}

/// Spawn the background task a coordinator uses to track `announceWorker`
/// events.
pub fn spawn_worker_event_listener(
    adapter: Arc<dyn MessagingAdapter>,
    tracker: Arc<Tracker>,
    logger: Logger,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = adapter.subscribe_event(SubscriptionFilter::new(ANNOUNCE_WORKER_TYPE));
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                item = events.next() => match item {
                    Some(item) => item,
                    None => break,
                },
            };

            if event.data.as_ref() == HELLO {
                if tracker.try_join(Role::Worker, event.id.clone()) {
                    logger.diag(format!("worker {} joined", event.id));
                }
            } else if event.data.as_ref() == BYE {
                tracker.leave(Role::Worker, event.id.clone());
                logger.diag(format!("worker {} left", event.id));
            }
        }
    })
}
