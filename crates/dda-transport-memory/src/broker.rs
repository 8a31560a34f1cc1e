//! Shared in-process routing state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio::sync::{broadcast, mpsc};

use dda_core::{Action, ActionResult, Event};

/// One action delivered to a subscriber, carrying the correlation id the
/// subscriber's reply must be routed back to.
pub(crate) struct RoutedAction {
    pub action: Action,
    pub correlation_id: u64,
}

#[derive(Default)]
struct ShareGroup {
    members: Vec<mpsc::UnboundedSender<RoutedAction>>,
    cursor: AtomicUsize,
}

#[derive(Default)]
struct ActionTypeSubs {
    broadcast: Vec<mpsc::UnboundedSender<RoutedAction>>,
    groups: HashMap<String, ShareGroup>,
}

/// In-process stand-in for the pub/sub substrate. Enforces shared-group
/// round robin, correlated action-results, and per publisher-subscriber
/// pair ordering (each subscriber has its own FIFO mpsc channel) without
/// persistence or exactly-once delivery.
#[derive(Default)]
pub(crate) struct Broker {
    event_subs: DashMap<String, broadcast::Sender<Event>>,
    action_subs: DashMap<String, ActionTypeSubs>,
    correlations: DashMap<u64, mpsc::Sender<ActionResult>>,
    next_correlation: AtomicU64,
    /// Action types configured to silently swallow every publish, used to
    /// simulate a broker that drops all deliveries.
    blackholed: DashSet<String>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blackhole(&self, kind: impl Into<String>) {
        self.blackholed.insert(kind.into());
    }

    pub fn next_correlation_id(&self) -> u64 {
        self.next_correlation.fetch_add(1, Ordering::Relaxed)
    }

    pub fn register_correlation(&self, id: u64, sender: mpsc::Sender<ActionResult>) {
        self.correlations.insert(id, sender);
    }

    pub fn forget_correlation(&self, id: u64) {
        self.correlations.remove(&id);
    }

    pub fn sender_for(&self, correlation_id: u64) -> Option<mpsc::Sender<ActionResult>> {
        self.correlations.get(&correlation_id).map(|e| e.clone())
    }

    pub fn publish_event(&self, event: Event) {
        if let Some(sender) = self.event_subs.get(&event.kind) {
            // No receivers is not an error: fire-and-forget semantics.
            let _ = sender.send(event);
        }
    }

    pub fn subscribe_event(&self, kind: &str) -> broadcast::Receiver<Event> {
        self.event_subs
            .entry(kind.to_string())
            .or_insert_with(|| broadcast::channel(1024).0)
            .subscribe()
    }

    pub fn dispatch_action(&self, action: Action, correlation_id: u64) {
        if self.blackholed.contains(&action.kind) {
            return;
        }
        let Some(mut subs) = self.action_subs.get_mut(&action.kind) else {
            return;
        };

        subs.broadcast.retain(|tx| {
            tx.send(RoutedAction {
                action: action.clone(),
                correlation_id,
            })
            .is_ok()
        });

        for group in subs.groups.values_mut() {
            if group.members.is_empty() {
                continue;
            }
            let idx = group.cursor.fetch_add(1, Ordering::Relaxed) % group.members.len();
            let _ = group.members[idx].send(RoutedAction {
                action: action.clone(),
                correlation_id,
            });
        }
    }

    pub fn subscribe_action(
        &self,
        kind: &str,
        share: Option<&str>,
    ) -> mpsc::UnboundedReceiver<RoutedAction> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subs = self.action_subs.entry(kind.to_string()).or_default();
        match share {
            Some(share) => subs.groups.entry(share.to_string()).or_default().members.push(tx),
            None => subs.broadcast.push(tx),
        }
        rx
    }
}
