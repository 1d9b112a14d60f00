//! Chain RPC endpoint configuration.

use std::time::Duration;
use url::Url;

/// Connection settings for a bitcoind JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Base URL, e.g. `http://127.0.0.1:18443/`.
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Wallet that wallet-scoped calls are routed to.
    pub wallet: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RpcConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            username: None,
            password: None,
            wallet: None,
            timeout: Duration::from_secs(30),
        }
    }
}
