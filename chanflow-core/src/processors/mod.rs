//! Processors that drive the node.
//!
//! - `WalletFunder`: makes the funding wallet the loaded one and mines
//!   until it can pay for a channel
//! - `WorkflowOrchestrator`: funding, peer, channel open, confirmations and
//!   payment as one linear run
//! - `PeerConnectionSequencer`: dials a list of peers one at a time
//! - `launch`: builds the engine's capabilities, starts the chain tip poller
//!   feeding the engine and spawns the workflow

pub mod launch;
pub mod peer_sequencer;
pub mod wallet_funding;
pub mod workflow;

pub use launch::{EngineContext, LaunchError, WorkflowLaunch, launch};
pub use peer_sequencer::{PeerConnectionSequencer, PeerFailure, PeerSimulation, SequenceReport};
pub use wallet_funding::{FundingError, FundingReport, WalletFunder};
pub use workflow::{
    WorkflowError, WorkflowOrchestrator, WorkflowReport, WorkflowState, WorkflowTask,
};
