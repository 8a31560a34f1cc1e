use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use dda_core::{ComputationRegistry, ComputeRequest, Logger, MessagingAdapter};
use dda_coordinator::{Cli, Coordinator, RunOutcome};
use dda_transport_memory::MemoryAdapter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let logger = Logger::new(cli.log);

    let registry = ComputationRegistry::new();
    dda_computations::register_all(&registry);

    let Some(computation) = registry.create(&cli.computation_name) else {
        // Argument errors print to the request's output sink, not stderr.
        let _ = writeln!(io::stdout(), "FAIL: unknown computation '{}'", cli.computation_name);
        return ExitCode::FAILURE;
    };

    if let Some(address) = &cli.dda_address {
        logger.diag(format!(
            "substrate endpoint '{address}' ignored: this binary ships only the in-process adapter"
        ));
    }

    let adapter: Arc<dyn MessagingAdapter> = Arc::new(MemoryAdapter::new());
    let coordinator = Coordinator::new(adapter, logger);
    let request = ComputeRequest::new(cli.computation_name.clone(), cli.args);

    let mut stdout = io::stdout();
    match coordinator.run(computation, &request, &mut stdout).await {
        RunOutcome::Finalized => ExitCode::SUCCESS,
        RunOutcome::FailFast(_) => ExitCode::FAILURE,
        // Already written to the output sink by `Coordinator::run`.
        RunOutcome::ArgumentError(_) => ExitCode::FAILURE,
    }
}
