//! ChainTipPoller.
//!
//! The ChainTipPoller is responsible for:
//! - Fetching the best block from a [`ChainBackend`] on a fixed or adaptive
//!   interval
//! - Comparing it with the blocks it has already announced, walking back
//!   height by height to the common ancestor when the chain reorganized
//! - Emitting disconnects (newest first) and then connects (oldest first)
//!   through the [`ListenerMultiplexer`], one notification at a time
//!
//! The last-known tip advances only after the matching notification went
//! out, so a failed RPC midway leaves the poller exactly where delivery
//! stopped. Shutdown is observed between iterations, never mid-RPC.

use super::{BackendError, ChainBackend, ListenerMultiplexer};
use crate::config::{AnchorHeight, PollInterval, PollerConfig};
use crate::utils::poll_interval::poll_interval;
use chanflow_sdk::objects::ChainTip;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Errors that can occur during a poll iteration.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("chain backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("anchor height {anchor} is above the chain tip at {tip}")]
    AnchorAboveTip { anchor: u32, tip: u32 },

    #[error("rolled back to height {height} without meeting the best chain")]
    NoCommonAncestor { height: u32 },
}

/// What a single poll iteration announced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub connected: u32,
    pub disconnected: u32,
}

impl PollOutcome {
    pub fn changed(&self) -> bool {
        self.connected > 0 || self.disconnected > 0
    }
}

/// Polls a chain backend and turns tip changes into block notifications.
pub struct ChainTipPoller {
    backend: Arc<dyn ChainBackend>,
    listeners: Arc<ListenerMultiplexer>,
    config: PollerConfig,
    /// Announced chain, oldest first. The back is the last-known tip.
    announced: VecDeque<ChainTip>,
    last_change: Instant,
}

impl ChainTipPoller {
    pub fn new(
        backend: Arc<dyn ChainBackend>,
        listeners: Arc<ListenerMultiplexer>,
        config: PollerConfig,
    ) -> Self {
        Self {
            backend,
            listeners,
            config,
            announced: VecDeque::new(),
            last_change: Instant::now(),
        }
    }

    /// The last block whose notification went out (or the anchor).
    pub fn last_tip(&self) -> Option<ChainTip> {
        self.announced.back().copied()
    }

    async fn anchor(&mut self) -> Result<ChainTip, PollError> {
        if let Some(tip) = self.announced.back() {
            return Ok(*tip);
        }

        let anchor = match self.config.anchor {
            AnchorHeight::ChainTip => self.backend.chain_tip().await?,
            AnchorHeight::Height(height) => {
                let tip = self.backend.chain_tip().await?;
                if height > tip.height {
                    return Err(PollError::AnchorAboveTip {
                        anchor: height,
                        tip: tip.height,
                    });
                }
                ChainTip::new(height, self.backend.block_hash(height).await?)
            }
        };

        info!(height = anchor.height, hash = %anchor.hash, "Chain tip poller anchored");
        self.announced.push_back(anchor);
        Ok(anchor)
    }

    /// Whether `known` is on the backend's best chain ending at `tip`.
    async fn on_best_chain(&self, known: &ChainTip, tip: &ChainTip) -> Result<bool, BackendError> {
        if known.height > tip.height {
            return Ok(false);
        }
        let current = if known.height == tip.height {
            tip.hash
        } else {
            self.backend.block_hash(known.height).await?
        };
        Ok(current == known.hash)
    }

    /// Run a single poll iteration.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, PollError> {
        let last = self.anchor().await?;
        let tip = self.backend.chain_tip().await?;
        if tip == last {
            return Ok(PollOutcome::default());
        }

        let mut outcome = PollOutcome::default();

        // Roll back, newest first, until the back of the history is on the
        // best chain. Once only one record is left, its parent takes its
        // place, so a fork older than the tracked history is still unwound
        // block by block.
        let ancestor = loop {
            let Some(stale) = self.announced.back().copied() else {
                return Err(PollError::NoCommonAncestor { height: 0 });
            };
            if self.on_best_chain(&stale, &tip).await? {
                break stale.height;
            }

            let parent = if self.announced.len() == 1 {
                let parent = self
                    .backend
                    .previous_block_hash(&stale.hash)
                    .await?
                    .ok_or(PollError::NoCommonAncestor {
                        height: stale.height,
                    })?;
                debug!(height = stale.height, parent = %parent, "Following parent link");
                Some(ChainTip::new(stale.height.saturating_sub(1), parent))
            } else {
                None
            };

            let header = self.backend.block_header(&stale.hash).await?;
            self.listeners.dispatch_disconnect(&header, stale.height);
            self.announced.pop_back();
            if let Some(parent) = parent {
                self.announced.push_back(parent);
            }
            self.last_change = Instant::now();
            outcome.disconnected += 1;
            debug!(height = stale.height, hash = %stale.hash, "Block disconnected");
        };

        for height in ancestor + 1..=tip.height {
            let hash = if height == tip.height {
                tip.hash
            } else {
                self.backend.block_hash(height).await?
            };
            let block = self.backend.block(&hash).await?;
            self.listeners.dispatch_connect(&block, height);
            self.announced.push_back(ChainTip::new(height, hash));
            while self.announced.len() > self.config.max_tracked_depth.max(1) {
                self.announced.pop_front();
            }
            self.last_change = Instant::now();
            outcome.connected += 1;
            debug!(height, hash = %hash, "Block connected");
        }

        if outcome.disconnected > 0 {
            info!(
                disconnected = outcome.disconnected,
                ancestor, "Chain reorganized"
            );
        }
        Ok(outcome)
    }

    fn next_interval(&self) -> Duration {
        match self.config.interval {
            PollInterval::Fixed(interval) => interval,
            PollInterval::Adaptive => poll_interval(self.last_change.elapsed()),
        }
    }

    /// Poll until shutdown is signaled.
    ///
    /// Backend failures are logged and retried on the next tick.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(interval = ?self.config.interval, "ChainTipPoller started");

        loop {
            if *shutdown_rx.borrow() {
                info!("ChainTipPoller received shutdown signal");
                break;
            }

            match self.poll_once().await {
                Ok(outcome) if outcome.changed() => {
                    if let Some(tip) = self.last_tip() {
                        info!(
                            connected = outcome.connected,
                            disconnected = outcome.disconnected,
                            height = tip.height,
                            hash = %tip.hash,
                            "Chain tip moved"
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Chain tip poll failed, retrying next tick");
                }
            }

            let interval = self.next_interval();
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("ChainTipPoller received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("ChainTipPoller shutdown complete");
    }

    /// Start polling on a background task.
    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        PollerHandle { shutdown_tx, task }
    }
}

/// Handle onto a spawned [`ChainTipPoller`].
///
/// Dropping the handle stops the poller at its next iteration boundary.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Ask the poller to stop. It finishes the iteration in progress first.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the poller and wait for it to exit.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            warn!(error = %e, "ChainTipPoller task ended abnormally");
        }
    }
}
