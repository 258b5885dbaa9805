//! relayer-deploy deploys the GasRelayer contract to one EVM chain per run and wires it
//! up as a cross-chain peer of the home deployment.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use relayer_deploy::{AlloyChain, RelayerChain, RelayerDeployer, Settings, chain_id_for};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity(settings.debug))
        .init();

    tracing::debug!(
        home_chain_id = settings.home_chain_id,
        dev = settings.dev,
        "Settings loaded"
    );

    let chain = AlloyChain::connect(&settings.web3_provider_url, &settings.web3_pk).await?;

    if let Some(network) = &cli.network {
        let expected = chain_id_for(network)?;
        if chain.chain_id() != expected {
            anyhow::bail!(
                "RPC endpoint serves chain {} but --network {} expects chain {}",
                chain.chain_id(),
                network,
                expected
            );
        }
    }

    let deployer = RelayerDeployer::from_settings(chain, &settings);

    match cli.command {
        Command::Deploy => {
            let report = deployer.deploy().await?;

            tracing::info!("✓ Deployment complete!");
            tracing::info!("Chain ID:        {}", report.chain_id);
            tracing::info!("Gas relayer:     {}", report.address);
            tracing::info!("Salt:            {}", report.salt);
            if let Some(peer) = report.peer {
                tracing::info!("Peer (eid {}):  {}", peer.eid, peer.peer);
                tracing::info!("set_peer tx:     {}", peer.tx_hash);
            }
        }
        Command::SetPeer => {
            let peer = deployer.set_peer().await?;

            tracing::info!("✓ Peer registered!");
            tracing::info!("Gas relayer:     {}", peer.contract);
            tracing::info!("Peer (eid {}):  {}", peer.eid, peer.peer);
            tracing::info!("set_peer tx:     {}", peer.tx_hash);
        }
    }

    Ok(())
}
