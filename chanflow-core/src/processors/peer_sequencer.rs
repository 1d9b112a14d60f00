//! PeerConnectionSequencer.
//!
//! The PeerConnectionSequencer is responsible for:
//! - Dialing a fixed list of peers strictly one after another
//! - Logging every attempt and recording its outcome
//! - Pacing: waiting a fixed delay after each attempt before the next one
//!
//! A failed peer never stops the sequence. A stop request is honoured
//! between attempts and during pacing, never in the middle of a connect.

use crate::config::SimulationConfig;
use crate::engine::PeerConnector;
use chanflow_sdk::objects::PeerAddress;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// A peer that could not be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    pub label: String,
    pub address: PeerAddress,
    pub error: String,
}

/// Outcome of one pass over the peer list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReport {
    /// Labels of the peers that connected, in dialing order.
    pub succeeded: Vec<String>,
    pub failed: Vec<PeerFailure>,
    /// The pass was stopped before the end of the list.
    pub interrupted: bool,
}

impl SequenceReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

pub struct PeerConnectionSequencer {
    connector: Arc<dyn PeerConnector>,
    config: SimulationConfig,
}

impl PeerConnectionSequencer {
    pub fn new(connector: Arc<dyn PeerConnector>, config: SimulationConfig) -> Self {
        Self { connector, config }
    }

    /// Dial every peer once.
    pub async fn run(&self) -> SequenceReport {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.run_until(shutdown_rx).await
    }

    /// Dial every peer once, stopping early when shutdown is signaled.
    pub async fn run_until(&self, mut shutdown_rx: watch::Receiver<bool>) -> SequenceReport {
        let mut report = SequenceReport::default();
        let total = self.config.peers.len();
        info!(total, pacing = ?self.config.pacing, "Peer connection sequence started");

        'peers: for (index, peer) in self.config.peers.iter().enumerate() {
            if *shutdown_rx.borrow() {
                report.interrupted = true;
                break;
            }

            info!(
                peer = %peer.label,
                address = %peer.address,
                attempt = index + 1,
                total,
                "Connecting to peer"
            );
            match self.connector.connect(&peer.address).await {
                Ok(()) => {
                    info!(peer = %peer.label, "Peer connected");
                    report.succeeded.push(peer.label.clone());
                }
                Err(e) => {
                    warn!(peer = %peer.label, error = %e, "Peer connection failed, moving on");
                    report.failed.push(PeerFailure {
                        label: peer.label.clone(),
                        address: peer.address.clone(),
                        error: e.to_string(),
                    });
                }
            }

            if index + 1 == total {
                break;
            }

            let resume_at = Instant::now() + self.config.pacing;
            loop {
                tokio::select! {
                    biased;

                    Ok(()) = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            report.interrupted = true;
                            break 'peers;
                        }
                    }

                    _ = tokio::time::sleep_until(resume_at) => break,
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            interrupted = report.interrupted,
            "Peer connection sequence finished"
        );
        report
    }

    /// Run the sequence on a background task.
    pub fn spawn(self) -> PeerSimulation {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run_until(shutdown_rx).await });
        PeerSimulation { shutdown_tx, task }
    }
}

/// Start/stop handle onto a spawned peer sequence.
pub struct PeerSimulation {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<SequenceReport>,
}

impl PeerSimulation {
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Wait for the sequence to finish and return what it got through.
    pub async fn join(self) -> SequenceReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Peer simulation task ended abnormally");
                SequenceReport {
                    interrupted: true,
                    ..SequenceReport::default()
                }
            }
        }
    }

    pub async fn shutdown(self) -> SequenceReport {
        self.stop();
        self.join().await
    }
}
