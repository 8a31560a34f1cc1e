use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use dda_core::{ComputationRegistry, Logger, MessagingAdapter};
use dda_transport_memory::MemoryAdapter;
use dda_worker::{Cli, Worker};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let logger = Logger::new(cli.log);

    if let Some(address) = &cli.broker_url {
        logger.diag(format!(
            "substrate endpoint '{address}' ignored: this binary ships only the in-process adapter"
        ));
    }

    let registry = ComputationRegistry::new();
    dda_computations::register_all(&registry);

    let adapter: Arc<dyn MessagingAdapter> = Arc::new(MemoryAdapter::new());
    let cancel = CancellationToken::new();
    let count = cli.worker_count();
    logger.diag(format!("spawning {count} worker instance(s)"));

    let mut handles = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let worker = Worker::new(adapter.clone(), registry.clone(), logger);
        let worker_cancel = cancel.clone();
        handles.push(tokio::spawn(async move { worker.run(worker_cancel).await }));
    }

    let _ = tokio::signal::ctrl_c().await;
    logger.diag("shutdown signal received, leaving the pool".to_string());
    cancel.cancel();

    for handle in handles {
        let _ = handle.await;
    }
}
