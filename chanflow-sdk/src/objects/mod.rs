pub mod amount;
pub mod chain;
pub mod peer;
pub mod rpc;

pub use amount::{SATS_PER_BTC, btc_to_sats, sats_to_btc};
pub use chain::{BlockHash, ChainTip, Txid};
pub use peer::{NodeId, PeerAddress};

/// Errors produced when decoding hex-encoded identifiers.
#[derive(Debug, thiserror::Error)]
pub enum HexError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Decode a hex string (with or without a `0x` prefix) into a fixed-size array.
pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| HexError::Length { expected: N, actual })
}
