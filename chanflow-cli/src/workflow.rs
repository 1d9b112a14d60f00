//! The workflow start action.

use crate::config::LoadedConfig;
use crate::shutdown::shutdown_signal;
use anyhow::Context;
use chanflow_core::chain::{BitcoindRpc, ChainBackend};
use chanflow_core::engine::{ChannelEngine, TcpPeerConnector};
use chanflow_core::processors::{EngineContext, WorkflowReport, WorkflowState, launch};
use std::sync::Arc;

/// Run the configured workflow against bitcoind with the engine that
/// `build_engine` constructs. SIGINT/SIGTERM cancel the run.
pub async fn run_workflow<E, F>(config: LoadedConfig, build_engine: F) -> anyhow::Result<WorkflowReport>
where
    E: ChannelEngine + 'static,
    F: FnOnce(EngineContext) -> Arc<E>,
{
    let workflow = config
        .workflow
        .context("no [workflow] section in the configuration")?;

    let backend: Arc<dyn ChainBackend> = Arc::new(BitcoindRpc::new(&config.rpc));
    let connector = Arc::new(TcpPeerConnector::default());
    let launched = launch(backend, connector, config.poller, workflow, build_engine)?;
    tracing::info!(run_id = %launched.run_id(), "Workflow running, press Ctrl-C to cancel");

    let mut state_rx = launched.subscribe();
    tokio::select! {
        _ = state_rx.wait_for(WorkflowState::is_terminal) => {}
        _ = shutdown_signal() => {
            tracing::warn!(state = %launched.state(), "Cancelling workflow");
            launched.cancel();
        }
    }

    let report = launched.finish().await.map_err(|e| {
        tracing::error!("Workflow failed: {}", e);
        e
    })?;
    tracing::info!(
        run_id = %report.run_id,
        channel_id = %report.channel_id,
        funding_txid = %report.funding_txid,
        payment_hash = %report.payment_hash,
        "Workflow completed"
    );
    Ok(report)
}
