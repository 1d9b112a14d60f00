//! Transaction broadcasting for the channel engine.
//!
//! The engine asks for broadcasts synchronously from its own threads; the
//! actual RPC runs as a task on the tokio runtime.

use crate::chain::ChainBackend;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, warn};

pub trait Broadcaster: Send + Sync {
    fn broadcast_transactions(&self, transactions: &[&[u8]]);
}

/// Sends transactions through a [`ChainBackend`].
pub struct ChainBroadcaster {
    backend: Arc<dyn ChainBackend>,
    runtime: Handle,
}

impl ChainBroadcaster {
    pub fn new(backend: Arc<dyn ChainBackend>, runtime: Handle) -> Self {
        Self { backend, runtime }
    }

    /// Bind to the runtime of the calling task. `None` outside a runtime.
    pub fn current(backend: Arc<dyn ChainBackend>) -> Option<Self> {
        Handle::try_current()
            .ok()
            .map(|runtime| Self::new(backend, runtime))
    }
}

impl Broadcaster for ChainBroadcaster {
    fn broadcast_transactions(&self, transactions: &[&[u8]]) {
        for transaction in transactions {
            let transaction = transaction.to_vec();
            let backend = Arc::clone(&self.backend);
            self.runtime.spawn(async move {
                match backend.broadcast_transaction(&transaction).await {
                    Ok(txid) => info!(txid = %txid, "Broadcast transaction"),
                    Err(e) => warn!(
                        error = %e,
                        tx = %hex::encode(&transaction),
                        "Failed to broadcast transaction"
                    ),
                }
            });
        }
    }
}

/// Drops every transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct MuteBroadcaster;

impl Broadcaster for MuteBroadcaster {
    fn broadcast_transactions(&self, _transactions: &[&[u8]]) {}
}
