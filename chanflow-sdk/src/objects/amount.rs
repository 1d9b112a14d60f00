//! Satoshi / BTC conversions.
//!
//! Internally every amount is an integer number of satoshis; bitcoind
//! speaks decimal BTC.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub const SATS_PER_BTC: u64 = 100_000_000;

/// Convert satoshis into a normalized BTC decimal (`1_300_000` -> `0.013`).
pub fn sats_to_btc(sats: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(sats), 8).normalize()
}

/// Convert a BTC decimal into satoshis, truncating sub-satoshi precision.
///
/// Returns `None` for negative or out-of-range values.
pub fn btc_to_sats(btc: Decimal) -> Option<u64> {
    if btc.is_sign_negative() {
        return None;
    }
    btc.checked_mul(Decimal::from(SATS_PER_BTC))?.trunc().to_u64()
}
