//! Orchestration core for the Partition-Compute-Accumulate (PCA) distributed
//! compute pattern: messaging adapter contract, lifecycle tracking,
//! computation registry/contract, and the shared lifecycle protocol used by
//! both coordinators and workers.
//!
//! The concrete pub/sub transport, concrete computations, and CLI entry
//! points live in sibling crates — this crate defines only the interfaces
//! and the distributed-orchestration logic that is agnostic to all three.

pub mod action_log;
pub mod computation;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod messaging;
pub mod rate_limit;
pub mod registry;
pub mod tracker;

pub use computation::{Computation, ComputeRequest, PartitionIter};
pub use envelope::{Action, ActionResult, Event, SubscriptionFilter};
pub use error::{AdapterError, AdapterResult, CoordinatorError, WorkerError};
pub use ids::{InstanceId, Role};
pub use messaging::{ActionResponder, ActionResponderImpl, ActionResultStream, IncomingAction, MessagingAdapter};
pub use rate_limit::free_worker_estimate;
pub use registry::ComputationRegistry;
pub use tracker::Tracker;

/// Wire type for partial-compute actions. The action's `id` field carries
/// the computation name, not a unique request id.
pub const PCOMP_TYPE: &str = "ddaexmpls.compute.pcomp";
/// Shared-subscription group all workers join for `pcomp` dispatch.
pub const PCOMP_SHARE: &str = "pcompute";
