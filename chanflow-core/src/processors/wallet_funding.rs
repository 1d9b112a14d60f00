//! WalletFunder.
//!
//! The WalletFunder is responsible for:
//! - Making the configured wallet the only loaded wallet (creating it if
//!   it does not exist yet)
//! - Mining until the wallet can fund a channel: one block to a wallet
//!   address, then enough blocks to a disposable address for that coinbase
//!   to mature
//!
//! There is no retry bound on mining; every round is a fresh pair of
//! `generatetoaddress` calls.

use crate::chain::{BackendError, ChainBackend};
use crate::config::FundingConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FundingError {
    #[error("chain backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("disposable script {script} has no address")]
    DisposableScriptUnusable { script: String },
}

/// What the funder had to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingReport {
    pub created_wallet: bool,
    pub unloaded_wallets: Vec<String>,
    pub mining_rounds: u32,
    pub balance_sats: u64,
}

pub struct WalletFunder {
    backend: Arc<dyn ChainBackend>,
    config: FundingConfig,
}

impl WalletFunder {
    pub fn new(backend: Arc<dyn ChainBackend>, config: FundingConfig) -> Self {
        Self { backend, config }
    }

    /// Make the configured wallet the one and only loaded wallet.
    async fn select_wallet(&self, report: &mut FundingReport) -> Result<(), FundingError> {
        let name = self.config.wallet_name.as_str();
        let loaded = self.backend.list_loaded_wallets().await?;

        for other in loaded.iter().filter(|w| w.as_str() != name) {
            info!(wallet = %other, "Unloading foreign wallet");
            self.backend.unload_wallet(other).await?;
            report.unloaded_wallets.push(other.clone());
        }

        if loaded.iter().any(|w| w == name) {
            debug!(wallet = %name, "Wallet already loaded");
            return Ok(());
        }

        let available = self.backend.list_available_wallets().await?;
        if available.iter().any(|w| w == name) {
            info!(wallet = %name, "Loading wallet");
            self.backend.load_wallet(name).await?;
        } else {
            // createwallet also loads it.
            info!(wallet = %name, "Creating wallet");
            self.backend.create_wallet(name).await?;
            report.created_wallet = true;
        }
        Ok(())
    }

    /// Address of the disposable script, preferring its P2WSH wrapping.
    pub async fn disposable_address(&self) -> Result<String, FundingError> {
        let decoded = self
            .backend
            .decode_script(&self.config.disposable_script)
            .await?;
        decoded
            .segwit_addresses()
            .into_iter()
            .chain(decoded.addresses())
            .next()
            .ok_or_else(|| FundingError::DisposableScriptUnusable {
                script: hex::encode(&self.config.disposable_script),
            })
    }

    /// Select the wallet and mine until its balance reaches the configured
    /// minimum.
    pub async fn ensure_spare_funds(&self) -> Result<FundingReport, FundingError> {
        let mut report = FundingReport::default();
        self.select_wallet(&mut report).await?;

        let minimum = self.config.min_wallet_balance_sats;
        let mut balance = self.backend.wallet_balance().await?;
        while balance < minimum {
            info!(balance_sats = balance, minimum_sats = minimum, "Wallet balance low, mining");

            let address = self.backend.new_address().await?;
            self.backend.mine_blocks(1, &address).await?;
            let disposable = self.disposable_address().await?;
            self.backend
                .mine_blocks(self.config.maturity_blocks, &disposable)
                .await?;

            report.mining_rounds += 1;
            balance = self.backend.wallet_balance().await?;
        }

        info!(
            wallet = %self.config.wallet_name,
            balance_sats = balance,
            rounds = report.mining_rounds,
            "Wallet funded"
        );
        report.balance_sats = balance;
        Ok(report)
    }
}
