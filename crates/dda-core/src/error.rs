//! Error taxonomy for the messaging adapter and the PCA core.

use thiserror::Error;

/// Errors surfaced by the [`crate::messaging::MessagingAdapter`].
#[derive(Error, Debug, Clone)]
pub enum AdapterError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("canceled")]
    Canceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Result alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors a coordinator can surface before or during a run.
#[derive(Error, Debug, Clone)]
pub enum CoordinatorError {
    /// Invalid CLI arguments, or `Computation::partition` rejected the
    /// request's arguments outright.
    #[error("argument error: {0}")]
    Argument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors a worker can surface. Workers never fail a single partial loudly
/// (see `Computation::partial_compute`'s contract) — this type exists for
/// startup/transport-level failures only.
#[derive(Error, Debug, Clone)]
pub enum WorkerError {
    #[error("internal error: {0}")]
    Internal(String),
}
