//! Configuration types for chanflow.
//!
//! These are the validated runtime values the core works with. Loading and
//! parsing the TOML file is handled by the CLI crate.

mod peers;
mod poller;
mod rpc;
mod workflow;

pub use peers::{PeerEntry, SimulationConfig};
pub use poller::{AnchorHeight, PollInterval, PollerConfig};
pub use rpc::RpcConfig;
pub use workflow::{ChannelParameters, FundingConfig, WorkflowConfig};
