//! bitcoind JSON-RPC backend.
//!
//! Node-level calls go to the base URL. Wallet-scoped calls go to
//! `<base>/wallet/<name>` when a wallet is configured, and to the base URL
//! otherwise, which bitcoind accepts as long as exactly one wallet is loaded.

use super::{BackendError, ChainBackend};
use crate::config::RpcConfig;
use async_trait::async_trait;
use chanflow_sdk::objects::rpc::{
    BlockHeaderInfo, BlockchainInfo, DecodedScript, RpcRequest, RpcResponse, WalletDir,
    WalletTransaction,
};
use chanflow_sdk::objects::{BlockHash, ChainTip, Txid, btc_to_sats, sats_to_btc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};
use url::Url;

#[derive(Debug, Clone, Copy)]
enum Scope {
    Node,
    Wallet,
}

/// [`ChainBackend`] over bitcoind's JSON-RPC interface.
pub struct BitcoindRpc {
    http_client: reqwest::Client,
    url: Url,
    wallet: Option<String>,
    auth: Option<(String, Option<String>)>,
    next_id: AtomicU64,
}

impl BitcoindRpc {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            url: config.url.clone(),
            wallet: config.wallet.clone(),
            auth: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
            next_id: AtomicU64::new(1),
        }
    }

    fn endpoint(&self, scope: Scope) -> Result<Url, BackendError> {
        match (scope, &self.wallet) {
            (Scope::Wallet, Some(name)) => self
                .url
                .join(&format!("wallet/{name}"))
                .map_err(|e| BackendError::Parse(format!("invalid wallet URL for {name}: {e}"))),
            _ => Ok(self.url.clone()),
        }
    }

    /// Send one request and return its `result`, which may be `null`.
    async fn request<T: DeserializeOwned>(
        &self,
        scope: Scope,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Option<T>, BackendError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = self.endpoint(scope)?;
        trace!(id, method, url = %url, "Sending RPC request");

        let mut request = self
            .http_client
            .post(url)
            .json(&RpcRequest::new(id, method, params));
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, password.as_ref());
        }

        // bitcoind reports RPC errors with a non-2xx status and a JSON body,
        // so the body is parsed regardless of status.
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let envelope: RpcResponse<T> = serde_json::from_str(&body).map_err(|e| {
            BackendError::Parse(format!("{method}: HTTP {status}: {e}"))
        })?;

        if let Some(error) = envelope.error {
            debug!(method, code = error.code, message = %error.message, "RPC call failed");
            return Err(BackendError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(envelope.result)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        scope: Scope,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, BackendError> {
        self.request(scope, method, params)
            .await?
            .ok_or_else(|| BackendError::Parse(format!("{method}: missing result")))
    }

    async fn call_unit(
        &self,
        scope: Scope,
        method: &str,
        params: Vec<Value>,
    ) -> Result<(), BackendError> {
        self.request::<Value>(scope, method, params).await?;
        Ok(())
    }

    async fn call_hex(
        &self,
        scope: Scope,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Vec<u8>, BackendError> {
        let encoded: String = self.call(scope, method, params).await?;
        Ok(hex::decode(encoded)?)
    }
}

#[async_trait]
impl ChainBackend for BitcoindRpc {
    async fn chain_tip(&self) -> Result<ChainTip, BackendError> {
        let info: BlockchainInfo = self.call(Scope::Node, "getblockchaininfo", vec![]).await?;
        Ok(ChainTip::new(info.blocks, info.bestblockhash))
    }

    async fn block_hash(&self, height: u32) -> Result<BlockHash, BackendError> {
        self.call(Scope::Node, "getblockhash", vec![json!(height)])
            .await
    }

    async fn block(&self, hash: &BlockHash) -> Result<Vec<u8>, BackendError> {
        self.call_hex(Scope::Node, "getblock", vec![json!(hash), json!(0)])
            .await
    }

    async fn block_header(&self, hash: &BlockHash) -> Result<Vec<u8>, BackendError> {
        self.call_hex(Scope::Node, "getblockheader", vec![json!(hash), json!(false)])
            .await
    }

    async fn previous_block_hash(
        &self,
        hash: &BlockHash,
    ) -> Result<Option<BlockHash>, BackendError> {
        let header: BlockHeaderInfo = self
            .call(Scope::Node, "getblockheader", vec![json!(hash), json!(true)])
            .await?;
        Ok(header.previousblockhash)
    }

    async fn decode_script(&self, script: &[u8]) -> Result<DecodedScript, BackendError> {
        self.call(Scope::Node, "decodescript", vec![json!(hex::encode(script))])
            .await
    }

    async fn send_to_address(
        &self,
        address: &str,
        amount_sats: u64,
    ) -> Result<Txid, BackendError> {
        let amount = sats_to_btc(amount_sats).to_string();
        self.call(
            Scope::Wallet,
            "sendtoaddress",
            vec![json!(address), json!(amount)],
        )
        .await
    }

    async fn raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, BackendError> {
        let transaction: WalletTransaction = self
            .call(Scope::Wallet, "gettransaction", vec![json!(txid)])
            .await?;
        Ok(hex::decode(transaction.hex)?)
    }

    async fn broadcast_transaction(&self, transaction: &[u8]) -> Result<Txid, BackendError> {
        self.call(
            Scope::Node,
            "sendrawtransaction",
            vec![json!(hex::encode(transaction))],
        )
        .await
    }

    async fn mine_blocks(
        &self,
        count: u32,
        address: &str,
    ) -> Result<Vec<BlockHash>, BackendError> {
        self.call(
            Scope::Node,
            "generatetoaddress",
            vec![json!(count), json!(address)],
        )
        .await
    }

    async fn new_address(&self) -> Result<String, BackendError> {
        self.call(Scope::Wallet, "getnewaddress", vec![]).await
    }

    async fn list_available_wallets(&self) -> Result<Vec<String>, BackendError> {
        let dir: WalletDir = self.call(Scope::Node, "listwalletdir", vec![]).await?;
        Ok(dir.names())
    }

    async fn list_loaded_wallets(&self) -> Result<Vec<String>, BackendError> {
        self.call(Scope::Node, "listwallets", vec![]).await
    }

    async fn create_wallet(&self, name: &str) -> Result<(), BackendError> {
        self.call_unit(Scope::Node, "createwallet", vec![json!(name)])
            .await
    }

    async fn load_wallet(&self, name: &str) -> Result<(), BackendError> {
        self.call_unit(Scope::Node, "loadwallet", vec![json!(name)])
            .await
    }

    async fn unload_wallet(&self, name: &str) -> Result<(), BackendError> {
        self.call_unit(Scope::Node, "unloadwallet", vec![json!(name)])
            .await
    }

    async fn wallet_balance(&self) -> Result<u64, BackendError> {
        // Raw literal; going through f64 loses digits near the supply cap.
        let raw: Box<RawValue> = self.call(Scope::Wallet, "getbalance", vec![]).await?;
        let balance = raw.get().trim();
        let btc = Decimal::from_str(balance)
            .or_else(|_| Decimal::from_scientific(balance))
            .map_err(|e| BackendError::Parse(format!("getbalance: {balance}: {e}")))?;
        btc_to_sats(btc)
            .ok_or_else(|| BackendError::Parse(format!("getbalance: {balance} out of range")))
    }
}
