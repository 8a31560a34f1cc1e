//! Coordinator CLI surface:
//! `coordinator [-h] [-l] [-d ddaAddress] <computation_name> [args...]`.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "coordinator", about = "Partition, dispatch, and accumulate one PCA request")]
pub struct Cli {
    /// Enable diagnostic logging.
    #[arg(short = 'l', long = "log")]
    pub log: bool,

    /// Substrate endpoint. The bundled binary only ships the in-process
    /// adapter, so this is accepted and logged but otherwise unused.
    #[arg(short = 'd', long = "dda-address", value_name = "ADDRESS")]
    pub dda_address: Option<String>,

    /// Registered computation name, e.g. `fac`, `wordfreq`, `pi`.
    pub computation_name: String,

    /// Arguments forwarded to the computation's `partition`.
    pub args: Vec<String>,
}
