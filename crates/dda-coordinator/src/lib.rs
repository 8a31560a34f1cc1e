//! Coordinator: runs the PCA loop that partitions a compute request,
//! dispatches partials under a fleet-size rate limit, accumulates worker
//! results, and finalizes or fails fast.

mod cli;
mod completion;
mod coordinator;
mod dispatch;

pub use cli::Cli;
pub use completion::Completion;
pub use coordinator::{Coordinator, RunOutcome};
