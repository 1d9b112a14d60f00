//! Shared value types for chanflow.
//!
//! Everything here is plain data: chain identifiers, peer addresses,
//! amount conversions and the bitcoind JSON-RPC envelope. No I/O.

pub mod objects;
