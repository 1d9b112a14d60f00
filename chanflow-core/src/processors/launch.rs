//! Workflow launch.
//!
//! `launch` is responsible for:
//! - Building the capabilities handed to the channel engine
//!   ([`EngineContext`])
//! - Registering the engine as the first block listener and starting the
//!   [`ChainTipPoller`] that feeds it
//! - Spawning the [`WorkflowOrchestrator`] on the same event aggregator the
//!   engine raises into
//!
//! The poller runs for as long as the workflow does; [`WorkflowLaunch::finish`]
//! stops it once the run has ended.

use super::workflow::{
    WorkflowError, WorkflowOrchestrator, WorkflowReport, WorkflowState, WorkflowTask,
};
use crate::chain::{BlockListener, ChainBackend, ChainTipPoller, ListenerMultiplexer, PollerHandle};
use crate::config::{PollerConfig, WorkflowConfig};
use crate::engine::{
    Broadcaster, ChainBroadcaster, ChannelEngine, ConstantFeeEstimator, EngineLogger,
    EphemeralPersister, FeeEstimator, PeerConnector, Persister, TracingLogger,
};
use crate::events::{Event, EventAggregator};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("workflow must be launched from within a tokio runtime")]
    NoRuntime,
}

/// What the channel engine is given at construction.
pub struct EngineContext {
    /// Every engine event goes here.
    pub events: EventAggregator<Event>,
    pub fee_estimator: Arc<dyn FeeEstimator>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub persister: Arc<dyn Persister>,
    pub logger: Arc<dyn EngineLogger>,
}

impl EngineContext {
    /// Constant fees, broadcasts through `backend` on `runtime`, acknowledged
    /// but unstored monitors, and engine logs in `tracing`.
    pub fn new(backend: Arc<dyn ChainBackend>, runtime: Handle) -> Self {
        Self {
            events: EventAggregator::new(),
            fee_estimator: Arc::new(ConstantFeeEstimator::new()),
            broadcaster: Arc::new(ChainBroadcaster::new(backend, runtime)),
            persister: Arc::new(EphemeralPersister::new()),
            logger: Arc::new(TracingLogger::new()),
        }
    }
}

/// A running workflow and the poller feeding its engine.
pub struct WorkflowLaunch {
    task: WorkflowTask,
    poller: PollerHandle,
    listeners: Arc<ListenerMultiplexer>,
}

impl WorkflowLaunch {
    pub fn run_id(&self) -> Uuid {
        self.task.run_id()
    }

    pub fn state(&self) -> WorkflowState {
        self.task.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.task.subscribe()
    }

    /// The multiplexer the poller dispatches to. The engine is its first
    /// listener; more can be added alongside it.
    pub fn listeners(&self) -> &Arc<ListenerMultiplexer> {
        &self.listeners
    }

    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// Wait for the run to end, then stop the poller.
    pub async fn finish(self) -> Result<WorkflowReport, WorkflowError> {
        let result = self.task.join().await;
        self.poller.shutdown().await;
        result
    }
}

/// Build the engine with its capabilities, start following the chain and
/// start the workflow.
pub fn launch<E, F>(
    backend: Arc<dyn ChainBackend>,
    connector: Arc<dyn PeerConnector>,
    poller_config: PollerConfig,
    workflow_config: WorkflowConfig,
    build_engine: F,
) -> Result<WorkflowLaunch, LaunchError>
where
    E: ChannelEngine + 'static,
    F: FnOnce(EngineContext) -> Arc<E>,
{
    let runtime = Handle::try_current().map_err(|_| LaunchError::NoRuntime)?;

    let context = EngineContext::new(Arc::clone(&backend), runtime);
    let events = context.events.clone();
    let engine = build_engine(context);

    let listeners = Arc::new(ListenerMultiplexer::new());
    let engine_listener: Arc<dyn BlockListener> = engine.clone();
    listeners.register(engine_listener);

    let poller = ChainTipPoller::new(Arc::clone(&backend), Arc::clone(&listeners), poller_config)
        .spawn();
    let task =
        WorkflowOrchestrator::new(backend, engine, connector, events, workflow_config).spawn();
    info!(run_id = %task.run_id(), "Workflow launched");

    Ok(WorkflowLaunch {
        task,
        poller,
        listeners,
    })
}
