//! Peer connections.
//!
//! The workflow connects to its counterparty and the simulation dials a list
//! of peers through [`PeerConnector`]. [`TcpPeerConnector`] establishes and
//! holds the TCP connection; the transport handshake on top of it belongs to
//! the engine.

use async_trait::async_trait;
use chanflow_sdk::objects::{NodeId, PeerAddress};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("could not reach {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out connecting to {addr}")]
    Timeout { addr: String },
}

#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(&self, peer: &PeerAddress) -> Result<(), ConnectError>;

    /// Node ids with an open connection.
    fn connected_peers(&self) -> Vec<NodeId>;
}

/// Opens a TCP connection per peer and keeps it open.
pub struct TcpPeerConnector {
    connect_timeout: Duration,
    streams: Mutex<HashMap<NodeId, TcpStream>>,
}

impl TcpPeerConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Close the connection to `node_id`. Returns `false` if there was none.
    pub fn disconnect(&self, node_id: &NodeId) -> bool {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(node_id)
            .is_some()
    }
}

impl Default for TcpPeerConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl PeerConnector for TcpPeerConnector {
    async fn connect(&self, peer: &PeerAddress) -> Result<(), ConnectError> {
        let addr = peer.socket_addr();
        debug!(node_id = %peer.node_id, addr = %addr, "Connecting to peer");

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ConnectError::Timeout { addr: addr.clone() })?
            .map_err(|source| ConnectError::Io {
                addr: addr.clone(),
                source,
            })?;

        info!(node_id = %peer.node_id, addr = %addr, "Connected to peer");
        // Reconnecting replaces (and closes) the previous stream.
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(peer.node_id, stream);
        Ok(())
    }

    fn connected_peers(&self) -> Vec<NodeId> {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }
}
