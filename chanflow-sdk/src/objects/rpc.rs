//! bitcoind JSON-RPC envelope and the response shapes chanflow reads.

use super::BlockHash;
use serde::{Deserialize, Serialize};

/// A JSON-RPC 1.0 request as accepted by bitcoind.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Vec<serde_json::Value>,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Vec<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "1.0",
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC response. Exactly one of `result` / `error` is meaningful.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// The error object bitcoind attaches to failed calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Subset of `getblockchaininfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: u32,
    pub bestblockhash: BlockHash,
}

/// Subset of verbose `getblockheader`. Genesis has no previous block.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeaderInfo {
    pub hash: BlockHash,
    pub height: u32,
    #[serde(default)]
    pub previousblockhash: Option<BlockHash>,
}

/// `listwalletdir` result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletDir {
    #[serde(default)]
    pub wallets: Vec<WalletDirEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletDirEntry {
    pub name: String,
}

impl WalletDir {
    pub fn names(self) -> Vec<String> {
        self.wallets.into_iter().map(|w| w.name).collect()
    }
}

/// Subset of the wallet's `gettransaction` result.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletTransaction {
    /// Serialized transaction, hex encoded.
    pub hex: String,
}

/// `decodescript` result.
///
/// Older bitcoind releases report `addresses`, newer ones a single `address`;
/// [`DecodedScript::addresses`] merges both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DecodedScript {
    #[serde(rename = "type", default)]
    pub script_type: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "addresses")]
    pub legacy_addresses: Vec<String>,
    #[serde(default)]
    pub segwit: Option<SegwitScript>,
}

/// The `segwit` sub-object of `decodescript`: the P2WSH wrapping of the script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SegwitScript {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "addresses")]
    pub legacy_addresses: Vec<String>,
}

fn merge(address: &Option<String>, legacy: &[String]) -> Vec<String> {
    let mut out: Vec<String> = address.iter().cloned().collect();
    for a in legacy {
        if !out.contains(a) {
            out.push(a.clone());
        }
    }
    out
}

impl DecodedScript {
    /// Addresses the script itself pays to.
    pub fn addresses(&self) -> Vec<String> {
        merge(&self.address, &self.legacy_addresses)
    }

    /// Addresses of the P2WSH wrapping, if bitcoind reported one.
    pub fn segwit_addresses(&self) -> Vec<String> {
        self.segwit
            .as_ref()
            .map(|s| merge(&s.address, &s.legacy_addresses))
            .unwrap_or_default()
    }
}
