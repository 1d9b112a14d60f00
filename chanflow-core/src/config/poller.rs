//! Chain tip poller configuration.

use std::time::Duration;

/// How long the poller sleeps between tip fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollInterval {
    Fixed(Duration),
    /// Short right after the tip moved, backing off while the chain is idle.
    Adaptive,
}

/// Where the poller starts tracking the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorHeight {
    /// Start at the current tip; existing blocks are not announced.
    ChainTip,
    /// Start at this height; later blocks are connected on the first poll.
    Height(u32),
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: PollInterval,
    pub anchor: AnchorHeight,
    /// How many announced blocks are remembered for reorg detection.
    pub max_tracked_depth: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: PollInterval::Adaptive,
            anchor: AnchorHeight::ChainTip,
            max_tracked_depth: 144,
        }
    }
}
