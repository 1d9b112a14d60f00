//! chanflow
//!
//! Regtest driver for the chanflow coordination layer: follow the chain tip,
//! fund the wallet, or run the multi-peer connection simulation. The
//! channel workflow itself needs an engine and starts from
//! [`chanflow_cli::run_workflow`].

use chanflow_core::chain::{BitcoindRpc, ChainBackend, ChainTipPoller, ListenerMultiplexer};
use chanflow_core::config::AnchorHeight;
use chanflow_core::engine::TcpPeerConnector;
use chanflow_core::processors::{PeerConnectionSequencer, WalletFunder};
use chanflow_cli::config::{ConfigLoader, LoadedConfig};
use chanflow_cli::listener::LoggingListener;
use chanflow_cli::shutdown::{shutdown_signal, spawn_shutdown_watch};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// chanflow - channel workflow coordination against a regtest node
#[derive(Parser, Debug)]
#[command(name = "chanflow")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./chanflow.toml", env = "CHANFLOW_CONFIG")]
    config: PathBuf,

    /// Override the bitcoind RPC URL
    #[arg(long, env = "CHANFLOW_RPC_URL")]
    rpc_url: Option<Url>,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the chain tip and log every block notification until Ctrl-C
    Watch {
        /// Replay blocks above this height before following the tip
        #[arg(long)]
        from_height: Option<u32>,
    },
    /// Select the funding wallet and mine until it holds enough funds
    Fund,
    /// Connect to every configured peer in turn
    Peers {
        /// Seconds to wait after each connection attempt
        #[arg(long)]
        pacing: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    tracing::info!("Starting chanflow v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = ConfigLoader::new(&args.config, args.rpc_url.clone());
    let config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let backend: Arc<dyn ChainBackend> = Arc::new(BitcoindRpc::new(&config.rpc));

    match args.command {
        Command::Watch { from_height } => watch(backend, config, from_height).await,
        Command::Fund => fund(backend, config).await,
        Command::Peers { pacing } => peers(config, pacing).await,
    }
}

async fn watch(
    backend: Arc<dyn ChainBackend>,
    mut config: LoadedConfig,
    from_height: Option<u32>,
) -> anyhow::Result<()> {
    if let Some(height) = from_height {
        config.poller.anchor = AnchorHeight::Height(height);
    }

    let logging = Arc::new(LoggingListener::new());
    let listeners = Arc::new(ListenerMultiplexer::new());
    listeners.register(logging.clone());

    let handle = ChainTipPoller::new(backend, listeners, config.poller).spawn();
    tracing::info!("Following chain tip, press Ctrl-C to stop");

    shutdown_signal().await;
    handle.shutdown().await;

    let (connected, disconnected) = logging.totals();
    tracing::info!(connected, disconnected, "Chain watch stopped");
    Ok(())
}

async fn fund(backend: Arc<dyn ChainBackend>, config: LoadedConfig) -> anyhow::Result<()> {
    let funder = WalletFunder::new(backend, config.funding);
    let report = funder.ensure_spare_funds().await.map_err(|e| {
        tracing::error!("Funding failed: {}", e);
        e
    })?;
    tracing::info!(
        created_wallet = report.created_wallet,
        unloaded = ?report.unloaded_wallets,
        mining_rounds = report.mining_rounds,
        balance_sats = report.balance_sats,
        "Funding complete"
    );
    Ok(())
}

async fn peers(mut config: LoadedConfig, pacing: Option<u64>) -> anyhow::Result<()> {
    if let Some(secs) = pacing {
        config.simulation.pacing = Duration::from_secs(secs);
    }
    if config.simulation.peers.is_empty() {
        anyhow::bail!("no peers configured under [simulation.peers]");
    }

    let connector = Arc::new(TcpPeerConnector::default());
    let sequencer = PeerConnectionSequencer::new(connector, config.simulation);
    let report = sequencer.run_until(spawn_shutdown_watch()).await;

    for failure in &report.failed {
        tracing::warn!(peer = %failure.label, address = %failure.address, error = %failure.error, "Peer unreachable");
    }
    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        interrupted = report.interrupted,
        "Peer simulation finished"
    );
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
