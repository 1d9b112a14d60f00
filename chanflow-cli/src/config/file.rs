//! TOML file configuration structures.
//!
//! These structs directly map to the `chanflow.toml` file format.

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub funding: FundingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Channel-and-payment run. Required only to launch the workflow.
    pub workflow: Option<WorkflowConfig>,
}

/// bitcoind RPC section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Wallet for wallet-scoped calls. Defaults to the funding wallet.
    pub wallet: Option<String>,
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

/// Chain tip poller section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Fixed poll interval. Adaptive when omitted.
    pub interval_secs: Option<u64>,
    /// Start height. The current tip when omitted.
    pub anchor_height: Option<u32>,
    pub max_tracked_depth: Option<usize>,
}

/// Funding wallet section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundingConfig {
    pub wallet_name: Option<String>,
    pub min_balance_sats: Option<u64>,
    pub maturity_blocks: Option<u32>,
    /// Hex-encoded script mined to when nobody needs the coins.
    pub disposable_script: Option<String>,
}

/// Multi-peer simulation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: u64,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pacing_secs: default_pacing_secs(),
            peers: vec![],
        }
    }
}

fn default_pacing_secs() -> u64 {
    5
}

/// Workflow section: the counterparty, the invoice and the run's pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// `<node_id>@<host>:<port>`
    pub peer: String,
    pub invoice: String,
    pub channel_value_sats: Option<u64>,
    pub reserve_msat: Option<u64>,
    pub confirmations: Option<u32>,
    pub peer_settle_secs: Option<u64>,
    pub usable_poll_interval_ms: Option<u64>,
    /// Give up on the usable-channel wait after this long. Waits forever when omitted.
    pub confirmation_deadline_secs: Option<u64>,
    pub observation_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub label: String,
    /// `<node_id>@<host>:<port>`
    pub address: String,
}
