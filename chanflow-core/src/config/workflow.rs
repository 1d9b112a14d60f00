//! Workflow configuration.

use chanflow_sdk::objects::PeerAddress;
use std::time::Duration;

/// Wallet the workflow funds channels from, and how it is topped up.
#[derive(Debug, Clone)]
pub struct FundingConfig {
    /// Created if missing; every other loaded wallet is unloaded.
    pub wallet_name: String,
    /// Below this the funder mines until the balance recovers.
    pub min_wallet_balance_sats: u64,
    /// Blocks mined to the disposable address so coinbase outputs mature.
    pub maturity_blocks: u32,
    /// Script whose address receives blocks nobody needs to spend.
    pub disposable_script: Vec<u8>,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            wallet_name: "POLAR_LDK_INTEGRATION_TEST_WALLET".to_string(),
            min_wallet_balance_sats: 5 * chanflow_sdk::objects::SATS_PER_BTC,
            maturity_blocks: 100,
            disposable_script: vec![0, 1, 0],
        }
    }
}

/// Parameters of the channel the workflow opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelParameters {
    pub value_sats: u64,
    /// Counterparty reserve we ask for, in millisatoshis.
    pub reserve_msat: u64,
}

impl Default for ChannelParameters {
    fn default() -> Self {
        Self {
            value_sats: 1_300_000,
            reserve_msat: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub funding: FundingConfig,
    /// The peer the channel is opened with.
    pub peer: PeerAddress,
    /// Pause after connecting before the connected peers are listed.
    pub peer_settle_delay: Duration,
    pub channel: ChannelParameters,
    /// Blocks mined after the funding transaction went out.
    pub confirmations: u32,
    pub usable_channel_poll_interval: Duration,
    /// Upper bound on the usable-channel wait. `None` waits forever.
    pub confirmation_deadline: Option<Duration>,
    /// BOLT11 invoice paid once the channel is usable.
    pub invoice: String,
    /// How long the run idles after the payment before finishing.
    pub observation_period: Duration,
}

impl WorkflowConfig {
    pub fn new(peer: PeerAddress, invoice: impl Into<String>) -> Self {
        Self {
            funding: FundingConfig::default(),
            peer,
            peer_settle_delay: Duration::from_secs(1),
            channel: ChannelParameters::default(),
            confirmations: 6,
            usable_channel_poll_interval: Duration::from_millis(100),
            confirmation_deadline: None,
            invoice: invoice.into(),
            observation_period: Duration::from_secs(60),
        }
    }
}
