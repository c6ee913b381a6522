//! Process bootstrap: CLI parsing, config loading, tracing init, and
//! lifecycle wiring — the out-of-scope "RPC service skeleton... process
//! bootstrap, and signal handling" §1 leaves to the surrounding runtime,
//! built here the way `s5_cli::main` builds it (`clap` + `clap_verbosity_flag`
//! + `tracing_subscriber::fmt` + a config file read up front).

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use repl_node::{Node, NodeConfig};
use repl_store_redb::RedbStore;
use tracing::{error, info};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the node's TOML config file.
    #[arg(short, long, value_name = "PATH", default_value = "repl_node.toml")]
    config: PathBuf,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,

    /// Overrides `region_id` from the config file.
    #[arg(long)]
    region_id: Option<u32>,

    /// Overrides `api_port` from the config file.
    #[arg(long)]
    api_port: Option<u16>,

    /// Overrides `gossip_port` from the config file.
    #[arg(long)]
    gossip_port: Option<u16>,

    /// Overrides `seed_peer_addr` from the config file.
    #[arg(long)]
    seed_peer_addr: Option<String>,

    /// Overrides `bind_addr` from the config file.
    #[arg(long)]
    bind_addr: Option<IpAddr>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.verbosity).init();

    if let Err(err) = run(cli).await {
        error!(error = %err, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&cli.config)
        .map_err(|source| anyhow::anyhow!("reading config {:?}: {source}", cli.config))?;
    let mut config = NodeConfig::from_toml_str(&contents)?;

    if let Some(region_id) = cli.region_id {
        config.region_id = region_id;
    }
    if let Some(api_port) = cli.api_port {
        config.api_port = api_port;
    }
    if let Some(gossip_port) = cli.gossip_port {
        config.gossip_port = gossip_port;
    }
    if cli.seed_peer_addr.is_some() {
        config.seed_peer_addr = cli.seed_peer_addr;
    }
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }

    let store = RedbStore::open_in_memory()?;
    let node = Arc::new(Node::new(config.clone(), store));
    node.start().await?;

    let router = repl_node::http::router(node.clone());
    let listener = tokio::net::TcpListener::bind(config.api_bind()).await?;
    info!(addr = %config.api_bind(), "http api listening");

    let server = axum::serve(listener, router);
    tokio::select! {
        result = server => {
            if let Err(err) = result {
                error!(error = %err, "http server error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received interrupt, shutting down");
        }
    }

    node.shutdown().await;
    Ok(())
}
