//! Substrate-level message envelopes consumed by the core.

use bytes::Bytes;

/// One-shot publish/subscribe message; no reply is expected.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: String,
    pub id: String,
    pub source: String,
    pub data: Bytes,
}

/// A request expecting zero or more correlated results.
#[derive(Debug, Clone)]
pub struct Action {
    pub kind: String,
    pub id: String,
    pub source: String,
    pub params: Bytes,
}

/// A correlated reply to an [`Action`].
///
/// `context` conveys the role or emitting-instance id of the responder;
/// `sequence_number` is unused by the core except where a computation
/// explicitly extends the contract — the core itself treats every
/// partial-compute action as single-result.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub context: String,
    pub sequence_number: i32,
    pub data: Bytes,
}

impl ActionResult {
    pub fn new(context: impl Into<String>, data: Bytes) -> Self {
        Self {
            context: context.into(),
            sequence_number: 0,
            data,
        }
    }
}

/// Filter used when subscribing to events or actions.
///
/// `share`, when set, opts into exclusive round-robin dispatch among
/// subscribers sharing the same group name — the substrate MUST deliver
/// each matching action to exactly one subscriber in the group.
#[derive(Debug, Clone)]
pub struct SubscriptionFilter {
    pub kind: String,
    pub share: Option<String>,
}

impl SubscriptionFilter {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            share: None,
        }
    }

    pub fn shared(kind: impl Into<String>, share: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            share: Some(share.into()),
        }
    }
}
