//! Main for building the embercoin node binary: parses the command line,
//! loads configuration, starts the node, and shuts it down cleanly on
//! Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ember_config::GlobalConfig;
use ember_servers::Node;
use ember_util::{LoggingConfig, StopHandle};
use log::{error, info};

/// A small proof-of-work cryptocurrency node.
#[derive(Parser, Debug)]
#[command(name = "embercoin", version, about)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the overlay listener port from the config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Starts the miner regardless of what the config file says.
    #[arg(long)]
    mine: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GlobalConfig::new(Some(&path.to_string_lossy()))?,
        None => GlobalConfig::new(None)?,
    };

    let members = config.members.get_or_insert_with(Default::default);
    if let Some(port) = cli.port {
        members.server.p2p_config.port = port;
    }
    if cli.mine {
        members.mining.get_or_insert_with(Default::default).enable_mining = true;
    }

    let logging = members.logging.clone().unwrap_or_else(LoggingConfig::default);
    ember_util::init_logger(logging);
    info!("embercoin: starting node");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(members.clone()))
}

async fn run(members: ember_config::ConfigMembers) -> anyhow::Result<()> {
    let stop = StopHandle::new();
    let node = Node::new(&members, stop.clone())?;

    let ctrlc_stop = stop.clone();
    ctrlc::set_handler(move || {
        info!("embercoin: received shutdown signal");
        ctrlc_stop.stop();
    })
    .expect("failed to install Ctrl-C handler");

    if let Err(e) = run_node(node).await {
        error!("embercoin: node exited with an error: {}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn run_node(node: Arc<Node>) -> Result<(), ember_servers::Error> {
    node.run().await
}
