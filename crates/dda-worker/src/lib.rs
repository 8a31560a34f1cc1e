//! Worker: subscribes to the shared `pcomp` dispatch group and serves
//! partial-compute actions one at a time.

mod cli;
mod worker;

pub use cli::Cli;
pub use worker::Worker;
