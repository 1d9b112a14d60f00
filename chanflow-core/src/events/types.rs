//! Event type definitions.
//!
//! Events are raised by the channel engine on its own threads and are
//! immutable once raised. The aggregator never looks inside them; only the
//! workflow dispatches on [`Event::kind`].

use chanflow_sdk::objects::NodeId;
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; 32]);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

id_newtype!(
    /// A channel id; temporary until the funding outpoint is known.
    ChannelId
);
id_newtype!(
    /// Engine-assigned identifier of an outbound payment.
    PaymentId
);
id_newtype!(
    /// Hash of the payment preimage.
    PaymentHash
);

/// Why a channel was closed, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureReason {
    CounterpartyForceClosed { peer_msg: String },
    HolderForceClosed,
    CooperativeClosure,
    CommitmentTxConfirmed,
    FundingTimedOut,
    ProcessingError { err: String },
    DisconnectedPeer,
    OutdatedChannelManager,
    Other(String),
}

impl fmt::Display for ClosureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosureReason::CounterpartyForceClosed { peer_msg } => {
                write!(f, "counterparty force-closed: {peer_msg}")
            }
            ClosureReason::HolderForceClosed => write!(f, "holder force-closed"),
            ClosureReason::CooperativeClosure => write!(f, "cooperative closure"),
            ClosureReason::CommitmentTxConfirmed => write!(f, "commitment transaction confirmed"),
            ClosureReason::FundingTimedOut => write!(f, "funding timed out"),
            ClosureReason::ProcessingError { err } => write!(f, "processing error: {err}"),
            ClosureReason::DisconnectedPeer => write!(f, "peer disconnected before funding"),
            ClosureReason::OutdatedChannelManager => write!(f, "outdated channel manager"),
            ClosureReason::Other(reason) => f.write_str(reason),
        }
    }
}

/// One hop of a payment path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteHop {
    pub node_id: NodeId,
    pub short_channel_id: u64,
    pub fee_msat: u64,
}

/// Notifications raised by the channel engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The engine wants a funding transaction paying `output_script`.
    FundingGenerationReady {
        temporary_channel_id: ChannelId,
        counterparty_node_id: NodeId,
        channel_value_satoshis: u64,
        output_script: Vec<u8>,
        user_channel_id: u128,
    },
    ChannelClosed {
        channel_id: ChannelId,
        user_channel_id: u128,
        reason: ClosureReason,
    },
    PaymentSent {
        payment_id: Option<PaymentId>,
        payment_hash: PaymentHash,
        fee_paid_msat: Option<u64>,
    },
    PaymentPathSuccessful {
        payment_id: PaymentId,
        payment_hash: Option<PaymentHash>,
        path: Vec<RouteHop>,
    },
    PaymentFailed {
        payment_id: PaymentId,
        payment_hash: Option<PaymentHash>,
    },
    /// Anything the workflow has no dedicated handling for.
    Other { kind: String },
}

/// The tag of an [`Event`], without its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    FundingGenerationReady,
    ChannelClosed,
    PaymentSent,
    PaymentPathSuccessful,
    PaymentFailed,
    Other(String),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::FundingGenerationReady { .. } => EventKind::FundingGenerationReady,
            Event::ChannelClosed { .. } => EventKind::ChannelClosed,
            Event::PaymentSent { .. } => EventKind::PaymentSent,
            Event::PaymentPathSuccessful { .. } => EventKind::PaymentPathSuccessful,
            Event::PaymentFailed { .. } => EventKind::PaymentFailed,
            Event::Other { kind } => EventKind::Other(kind.clone()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::FundingGenerationReady => write!(f, "funding_generation_ready"),
            EventKind::ChannelClosed => write!(f, "channel_closed"),
            EventKind::PaymentSent => write!(f, "payment_sent"),
            EventKind::PaymentPathSuccessful => write!(f, "payment_path_successful"),
            EventKind::PaymentFailed => write!(f, "payment_failed"),
            EventKind::Other(kind) => f.write_str(kind),
        }
    }
}
