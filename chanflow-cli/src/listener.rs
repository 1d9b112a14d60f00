//! Block listener used by `chanflow watch`.

use chanflow_core::chain::{BlockListener, ListenerError};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Serialized block header length.
const HEADER_LEN: usize = 80;

/// Logs every block notification.
#[derive(Debug, Default)]
pub struct LoggingListener {
    connected: AtomicU64,
    disconnected: AtomicU64,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connected and disconnected counts so far.
    pub fn totals(&self) -> (u64, u64) {
        (
            self.connected.load(Ordering::Relaxed),
            self.disconnected.load(Ordering::Relaxed),
        )
    }
}

impl BlockListener for LoggingListener {
    fn name(&self) -> &str {
        "logging"
    }

    fn block_connected(&self, block: &[u8], height: u32) -> Result<(), ListenerError> {
        self.connected.fetch_add(1, Ordering::Relaxed);
        let header = &block[..block.len().min(HEADER_LEN)];
        info!(height, size = block.len(), header = %hex::encode(header), "Block connected");
        Ok(())
    }

    fn block_disconnected(&self, header: &[u8], height: u32) -> Result<(), ListenerError> {
        self.disconnected.fetch_add(1, Ordering::Relaxed);
        info!(height, header = %hex::encode(header), "Block disconnected");
        Ok(())
    }
}
