//! Chain access: the backend seam, block listeners and the tip poller.
//!
//! - [`ChainBackend`]: what the core needs from a chain RPC endpoint
//! - [`BitcoindRpc`]: the bitcoind JSON-RPC implementation
//! - [`ListenerMultiplexer`]: ordered fan-out of block notifications
//! - [`ChainTipPoller`]: turns tip changes into connect/disconnect calls

pub mod bitcoind;
pub mod listener;
pub mod poller;

pub use bitcoind::BitcoindRpc;
pub use listener::{BlockListener, DispatchReport, ListenerError, ListenerMultiplexer};
pub use poller::{ChainTipPoller, PollError, PollOutcome, PollerHandle};

use async_trait::async_trait;
use chanflow_sdk::objects::rpc::DecodedScript;
use chanflow_sdk::objects::{BlockHash, ChainTip, Txid};
use thiserror::Error;

/// Errors returned by a [`ChainBackend`].
///
/// All of them are treated as transient by the poller; the workflow
/// surfaces them to its caller.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure
    #[error("RPC request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The node answered with an error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response did not have the expected shape
    #[error("RPC response parsing error: {0}")]
    Parse(String),

    /// Hex payload could not be decoded
    #[error("invalid hex in RPC response: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Everything the core asks of a chain data source and its wallet.
///
/// Amounts are satoshis. Every call is a remote call and may fail
/// transiently.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Height and hash of the current best block.
    async fn chain_tip(&self) -> Result<ChainTip, BackendError>;

    /// Hash of the block at `height` on the backend's current best chain.
    async fn block_hash(&self, height: u32) -> Result<BlockHash, BackendError>;

    /// Serialized block.
    async fn block(&self, hash: &BlockHash) -> Result<Vec<u8>, BackendError>;

    /// Serialized 80-byte block header. Works for stale blocks too.
    async fn block_header(&self, hash: &BlockHash) -> Result<Vec<u8>, BackendError>;

    /// Parent of `hash`, or `None` for genesis. Works for stale blocks too.
    async fn previous_block_hash(&self, hash: &BlockHash)
    -> Result<Option<BlockHash>, BackendError>;

    async fn decode_script(&self, script: &[u8]) -> Result<DecodedScript, BackendError>;

    /// Pay `amount_sats` from the wallet to `address`.
    async fn send_to_address(&self, address: &str, amount_sats: u64)
    -> Result<Txid, BackendError>;

    /// Serialized transaction known to the wallet.
    async fn raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, BackendError>;

    async fn broadcast_transaction(&self, transaction: &[u8]) -> Result<Txid, BackendError>;

    /// Mine `count` blocks paying the coinbase to `address`.
    async fn mine_blocks(&self, count: u32, address: &str)
    -> Result<Vec<BlockHash>, BackendError>;

    async fn new_address(&self) -> Result<String, BackendError>;

    /// Wallets present on disk, loaded or not.
    async fn list_available_wallets(&self) -> Result<Vec<String>, BackendError>;

    async fn list_loaded_wallets(&self) -> Result<Vec<String>, BackendError>;

    async fn create_wallet(&self, name: &str) -> Result<(), BackendError>;

    async fn load_wallet(&self, name: &str) -> Result<(), BackendError>;

    async fn unload_wallet(&self, name: &str) -> Result<(), BackendError>;

    /// Trusted wallet balance in satoshis.
    async fn wallet_balance(&self) -> Result<u64, BackendError>;
}
