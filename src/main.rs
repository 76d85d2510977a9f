use anyhow::Context;
use clap::Parser;
use paychan::{server::run_server, ChannelState, Node, NodeConfig};
use std::{path::PathBuf, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
#[clap(name = env!("CARGO_BIN_NAME"))]
#[clap(version)]
struct Args {
    #[clap(long)]
    pub config_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = NodeConfig::load(&args.config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut node = Node::in_memory(config.chain_id.clone());
    for balance in &config.initial_balances {
        for coin in &balance.coins {
            node.credit(&balance.address, coin)?;
        }
        info!(address = ?balance.address, "credited initial balance");
    }

    info!(chain_id = %config.chain_id, "starting payment channel node");
    let state = ChannelState::new(node, &config);
    run_server(config.listen_address, Arc::new(state))
        .await
        .context("server terminated")
}
