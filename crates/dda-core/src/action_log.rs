//! Coordinator-internal, append-ordered action log.
//!
//! Purely observational, never consulted for correctness — owned solely by
//! the coordinator loop task, so it needs no synchronization.

use std::collections::VecDeque;
use std::time::Instant;

use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct ActionLogResult {
    pub worker_id: String,
    pub data: Bytes,
    pub result_time: Instant,
}

#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    /// Coordinator-local dispatch sequence number. Distinct from the wire
    /// action `id`, which for `pcomp` actions carries the computation name
    /// and is therefore shared by every partial of one request.
    pub log_id: u64,
    pub action_id: String,
    pub params: Bytes,
    pub action_time: Instant,
    pub results: Vec<ActionLogResult>,
    pub error: Option<String>,
}

/// New entries are prepended, so the most recent dispatch is always first.
#[derive(Debug, Default)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&mut self, log_id: u64, action_id: impl Into<String>, params: Bytes) {
        self.entries.push_front(ActionLogEntry {
            log_id,
            action_id: action_id.into(),
            params,
            action_time: Instant::now(),
            results: Vec::new(),
            error: None,
        });
    }

    /// Attach a result to the entry with the given `log_id`.
    pub fn record_result(&mut self, log_id: u64, worker_id: String, data: Bytes) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.log_id == log_id) {
            entry.results.push(ActionLogResult {
                worker_id,
                data,
                result_time: Instant::now(),
            });
        }
    }

    pub fn record_error(&mut self, log_id: u64, error: impl Into<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.log_id == log_id) {
            entry.error = Some(error.into());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }
}
