//! Fee estimation for the channel engine.
//!
//! Regtest has no fee market, so a single floor rate serves every target.
//! Rates are in satoshis per 1000 weight units (sat/kw).

/// What a fee rate is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmationTarget {
    /// Sweeps that must confirm before a timelock expires.
    UrgentOnChainSweep,
    /// Commitment transactions.
    ChannelFee,
    /// Funding and cooperative close transactions.
    ChannelOpenClose,
    /// Lowest rate a counterparty may propose.
    MinimumAllowed,
}

pub trait FeeEstimator: Send + Sync {
    fn sat_per_kw(&self, target: ConfirmationTarget) -> u32;
}

/// Minimum relay fee: 1 sat/vB.
pub const FEERATE_FLOOR_SAT_PER_KW: u32 = 253;

/// Returns the same rate for every target.
#[derive(Debug, Clone, Copy)]
pub struct ConstantFeeEstimator {
    sat_per_kw: u32,
}

impl ConstantFeeEstimator {
    pub fn new() -> Self {
        Self {
            sat_per_kw: FEERATE_FLOOR_SAT_PER_KW,
        }
    }

    /// Rates below the relay floor are raised to it.
    pub fn with_rate(sat_per_kw: u32) -> Self {
        Self {
            sat_per_kw: sat_per_kw.max(FEERATE_FLOOR_SAT_PER_KW),
        }
    }
}

impl Default for ConstantFeeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeEstimator for ConstantFeeEstimator {
    fn sat_per_kw(&self, _target: ConfirmationTarget) -> u32 {
        self.sat_per_kw
    }
}
