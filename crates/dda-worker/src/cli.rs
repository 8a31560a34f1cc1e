//! Worker CLI surface: `worker [-h] [-l] [-b brokerUrl] [count]`.

use clap::Parser;

const MAX_COUNT: u16 = 100;
const DEFAULT_COUNT: u16 = 10;

#[derive(Parser, Debug)]
#[command(name = "worker", about = "Serve partial-compute actions off the shared dispatch group")]
pub struct Cli {
    /// Enable diagnostic logging.
    #[arg(short = 'l', long = "log")]
    pub log: bool,

    /// Substrate endpoint. The bundled binary only ships the in-process
    /// adapter, so this is accepted and logged but otherwise unused.
    #[arg(short = 'b', long = "broker-url", value_name = "ADDRESS")]
    pub broker_url: Option<String>,

    /// Number of worker instances to run in this process, 1-100.
    #[arg(default_value_t = DEFAULT_COUNT)]
    pub count: u16,
}

impl Cli {
    /// `count`, clamped to the CLI's documented 1-100 range.
    pub fn worker_count(&self) -> u16 {
        self.count.clamp(1, MAX_COUNT)
    }
}
