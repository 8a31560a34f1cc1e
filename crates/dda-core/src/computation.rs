//! Contract for pluggable PCA computations.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CoordinatorError;

/// A single compute request: a named computation plus its ordered argument
/// list. The output sink is threaded separately into `finalize`/fail-fast so
/// intermediate diagnostics (logged via the `tracing` machinery) never land
/// in the same stream as the machine-parsable result.
#[derive(Debug, Clone)]
pub struct ComputeRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl ComputeRequest {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// A lazily-produced sequence of partial inputs. The sequence's end signals
/// "all inputs emitted" — there is no separate EOF error.
pub type PartitionIter = Box<dyn Iterator<Item = Bytes> + Send>;

/// Contract implemented by a pluggable PCA computation. One `Computation`
/// instance is shared, read-only, across every worker in the pool (via the
/// [`crate::registry::ComputationRegistry`]); a separate, owned instance is
/// used by the coordinator driving one request (for `partition`/`accumulate`/
/// `finalize`, which are stateful on the coordinator side).
///
/// # Encoding contract
///
/// `BinaryData` (here, [`bytes::Bytes`]) is uninterpreted by the core;
/// encoding is entirely computation-private. Implementations MUST treat
/// every `partial_compute` call as an independent, self-describing message:
/// some binary encodings (as observed in the original π and word-frequency
/// computations this core replaces) emit type metadata only on the first
/// message of a stream, and will silently corrupt later messages if the
/// same stateful encoder/decoder is reused across calls. Construct a fresh
/// encoder/decoder per call.
#[async_trait]
pub trait Computation: Send + Sync {
    /// Short, stable name used as the wire `id` of `pcomp` actions and as
    /// the registry lookup key.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Partition a request into partial inputs. Invoked once, on a
    /// coordinator. Rejects (returns `Err`) only for invalid request
    /// arguments — not for downstream compute failures.
    fn partition(&self, request: &ComputeRequest) -> Result<PartitionIter, CoordinatorError>;

    /// Compute one partial. Invoked on a worker.
    ///
    /// - `Some(non-empty)` ⇒ success, forwarded to the coordinator's
    ///   `accumulate`.
    /// - `Some(empty)` ⇒ a computational or encoding error occurred; this is
    ///   fatal and triggers coordinator fail-fast.
    /// - `None` ⇒ the worker declines; the coordinator's timeout will
    ///   resubmit this input to another worker.
    async fn partial_compute(&self, input: Bytes) -> Option<Bytes>;

    /// Worst-case per-partial budget, inclusive of network round-trip.
    fn partial_compute_timeout(&self) -> Duration;

    /// Fold one partial output into the running result. Invoked serially on
    /// the coordinator — never concurrently with itself.
    fn accumulate(&mut self, output: Bytes);

    /// Render the final result to `sink`, once, only on success.
    fn finalize(&mut self, start_time: Instant, sink: &mut dyn std::io::Write) -> std::io::Result<()>;
}
