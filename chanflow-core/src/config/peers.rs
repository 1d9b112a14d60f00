//! Multi-peer connection simulation configuration.

use chanflow_sdk::objects::PeerAddress;
use std::time::Duration;

/// One peer the simulation dials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    /// Human-readable name used in logs.
    pub label: String,
    pub address: PeerAddress,
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Dialed in this order.
    pub peers: Vec<PeerEntry>,
    /// Wait after every attempt, successful or not.
    pub pacing: Duration,
}

impl SimulationConfig {
    pub fn new(peers: Vec<PeerEntry>) -> Self {
        Self {
            peers,
            pacing: Duration::from_secs(5),
        }
    }
}
