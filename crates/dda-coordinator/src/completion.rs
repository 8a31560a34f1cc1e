//! Completion records fed back from dispatch helper tasks to the PCA loop.

use bytes::Bytes;

#[derive(Debug)]
pub enum Completion {
    /// `ActionResult.data` was non-empty.
    Success {
        log_id: u64,
        worker_id: String,
        data: Bytes,
    },
    /// `ActionResult.data` was empty — a computational or encoding error,
    /// fatal to the whole request.
    FatalComputational { log_id: u64 },
    /// The result stream closed without a usable reply (deadline or
    /// transport error); the original input bytes are preserved so the
    /// dispatch can be retried verbatim.
    Resubmit {
        log_id: u64,
        original_input: Bytes,
        cause: String,
    },
}
