//! Channel monitor persistence.
//!
//! The regtest workflow is throwaway, so monitors are acknowledged without
//! being written anywhere. Counters make the traffic visible in logs and
//! tests.

use chanflow_sdk::objects::Txid;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Result of a monitor write as reported back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMonitorUpdateStatus {
    Completed,
    /// The write will complete later; the engine pauses the channel until then.
    InProgress,
    UnrecoverableError,
}

/// Funding outpoint identifying a channel monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Txid,
    pub index: u16,
}

pub trait Persister: Send + Sync {
    fn persist_new_channel(&self, funding: &OutPoint, monitor: &[u8]) -> ChannelMonitorUpdateStatus;

    fn update_persisted_channel(
        &self,
        funding: &OutPoint,
        update: Option<&[u8]>,
        monitor: &[u8],
    ) -> ChannelMonitorUpdateStatus;
}

/// Acknowledges every write immediately and keeps nothing.
#[derive(Debug, Default)]
pub struct EphemeralPersister {
    new_channels: AtomicUsize,
    updates: AtomicUsize,
}

impl EphemeralPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_channel_count(&self) -> usize {
        self.new_channels.load(Ordering::Acquire)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::Acquire)
    }
}

impl Persister for EphemeralPersister {
    fn persist_new_channel(&self, funding: &OutPoint, monitor: &[u8]) -> ChannelMonitorUpdateStatus {
        self.new_channels.fetch_add(1, Ordering::AcqRel);
        debug!(txid = %funding.txid, index = funding.index, bytes = monitor.len(), "Persisted new channel monitor");
        ChannelMonitorUpdateStatus::Completed
    }

    fn update_persisted_channel(
        &self,
        funding: &OutPoint,
        update: Option<&[u8]>,
        monitor: &[u8],
    ) -> ChannelMonitorUpdateStatus {
        self.updates.fetch_add(1, Ordering::AcqRel);
        debug!(
            txid = %funding.txid,
            index = funding.index,
            update_bytes = update.map_or(0, <[u8]>::len),
            bytes = monitor.len(),
            "Persisted channel monitor update"
        );
        ChannelMonitorUpdateStatus::Completed
    }
}
