//! Remote node identities and network addresses.

use super::{HexError, decode_fixed};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A compressed secp256k1 public key identifying a Lightning node.
///
/// Only the encoding is checked (33 bytes, `0x02`/`0x03` prefix); curve
/// membership is the channel engine's business.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId([u8; 33]);

/// Errors produced when parsing a [`NodeId`] or [`PeerAddress`].
#[derive(Debug, thiserror::Error)]
pub enum PeerParseError {
    #[error("invalid node id: {0}")]
    Hex(#[from] HexError),
    #[error("node id must start with 0x02 or 0x03, got {0:#04x}")]
    NotCompressed(u8),
    #[error("expected <node_id>@<host>:<port>, got {0:?}")]
    Format(String),
    #[error("invalid port {0:?}")]
    Port(String),
}

impl NodeId {
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, PeerParseError> {
        match bytes[0] {
            0x02 | 0x03 => Ok(Self(bytes)),
            other => Err(PeerParseError::NotCompressed(other)),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

impl FromStr for NodeId {
    type Err = PeerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 33] = decode_fixed(s)?;
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Where to reach a remote node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAddress {
    pub node_id: NodeId,
    pub host: String,
    pub port: u16,
}

impl PeerAddress {
    pub fn new(node_id: NodeId, host: impl Into<String>, port: u16) -> Self {
        Self {
            node_id,
            host: host.into(),
            port,
        }
    }

    /// `host:port`, suitable for a socket connect.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.node_id, self.host, self.port)
    }
}

/// Parses the usual `<node_id>@<host>:<port>` form.
impl FromStr for PeerAddress {
    type Err = PeerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (node_id, addr) = s
            .split_once('@')
            .ok_or_else(|| PeerParseError::Format(s.to_string()))?;
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| PeerParseError::Format(s.to_string()))?;
        if host.is_empty() {
            return Err(PeerParseError::Format(s.to_string()));
        }
        let port = port
            .parse()
            .map_err(|_| PeerParseError::Port(port.to_string()))?;
        Ok(Self::new(node_id.parse()?, host, port))
    }
}
