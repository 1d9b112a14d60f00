//! Seams to the payment-channel engine.
//!
//! The engine itself lives outside this crate. The workflow drives it through
//! [`ChannelEngine`]; the engine in turn is handed the narrow capabilities it
//! needs from the node:
//!
//! - [`EventHandler`]: where engine events go (the event aggregator)
//! - [`FeeEstimator`]: fee rates for commitment and funding transactions
//! - [`Broadcaster`]: publishing transactions through the chain backend
//! - [`Persister`]: channel monitor storage
//! - [`EngineLogger`]: the engine's log records
//!
//! Block notifications reach the engine because every `ChannelEngine` is a
//! [`BlockListener`] registered with the listener multiplexer.

pub mod broadcaster;
pub mod fee_estimator;
pub mod logger;
pub mod peer;
pub mod persister;

pub use broadcaster::{Broadcaster, ChainBroadcaster, MuteBroadcaster};
pub use fee_estimator::{ConfirmationTarget, ConstantFeeEstimator, FeeEstimator};
pub use logger::{EngineLogger, Level, MuteLogger, Record, TracingLogger};
pub use peer::{ConnectError, PeerConnector, TcpPeerConnector};
pub use persister::{ChannelMonitorUpdateStatus, EphemeralPersister, OutPoint, Persister};

use crate::chain::BlockListener;
use crate::config::ChannelParameters;
use crate::events::{ChannelId, Event, PaymentId};
use chanflow_sdk::objects::NodeId;
use thiserror::Error;

/// Receives every event the engine raises, on whatever thread raised it.
pub trait EventHandler<E = Event>: Send + Sync {
    fn handle_event(&self, event: E);
}

/// Engine API failures, tagged by cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("API misuse: {err}")]
    ApiMisuse { err: String },

    #[error("channel unavailable: {err}")]
    ChannelUnavailable { err: String },

    #[error("fee rate too high ({feerate} sat/kw): {err}")]
    FeeRateTooHigh { err: String, feerate: u32 },

    #[error("incompatible shutdown script: {}", hex::encode(script))]
    IncompatibleShutdownScript { script: Vec<u8> },

    #[error("route error: {err}")]
    RouteError { err: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid invoice: {0}")]
pub struct InvoiceParseError(pub String);

/// Why a payment could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("invoice rejected: {0}")]
    Invoice(String),

    #[error("no route: {0}")]
    Routing(String),

    #[error("sending failed: {0}")]
    Sending(String),
}

/// Snapshot of one channel as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDetails {
    pub channel_id: ChannelId,
    pub counterparty: NodeId,
    /// Assigned once the funding transaction is confirmed.
    pub short_channel_id: Option<u64>,
    pub channel_value_satoshis: u64,
    pub outbound_capacity_msat: u64,
    pub is_usable: bool,
}

/// The operations the workflow needs from a payment-channel engine.
///
/// Calls are synchronous; their consequences arrive later as events through
/// the engine's [`EventHandler`].
pub trait ChannelEngine: BlockListener {
    /// Parsed invoice type of this engine.
    type Invoice: Send + Sync;

    /// Start opening a channel. Returns the temporary channel id.
    fn create_channel(
        &self,
        counterparty: &NodeId,
        parameters: &ChannelParameters,
        user_channel_id: u128,
    ) -> Result<ChannelId, ApiError>;

    /// Hand over the signed funding transaction for a pending channel.
    fn funding_transaction_generated(
        &self,
        temporary_channel_id: &ChannelId,
        counterparty: &NodeId,
        transaction: Vec<u8>,
    ) -> Result<(), ApiError>;

    fn list_usable_channels(&self) -> Vec<ChannelDetails>;

    fn parse_invoice(&self, invoice: &str) -> Result<Self::Invoice, InvoiceParseError>;

    fn pay_invoice(&self, invoice: &Self::Invoice) -> Result<PaymentId, PaymentError>;
}
