//! Configuration module for the chanflow CLI.
//!
//! Reads the TOML file, applies CLI overrides, validates it and converts it
//! into the runtime configuration types of `chanflow-core`.

pub mod file;

use crate::config::file::FileConfig;
use chanflow_core::config::{
    AnchorHeight, FundingConfig, PeerEntry, PollInterval, PollerConfig, RpcConfig,
    SimulationConfig, WorkflowConfig,
};
use chanflow_sdk::objects::PeerAddress;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration, ready for `chanflow-core`.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub rpc: RpcConfig,
    pub poller: PollerConfig,
    pub funding: FundingConfig,
    pub simulation: SimulationConfig,
    /// Present when the file has a `[workflow]` section.
    pub workflow: Option<WorkflowConfig>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    rpc_url_override: Option<Url>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, rpc_url_override: Option<Url>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            rpc_url_override,
        }
    }

    /// Read, override, validate and convert.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, config_content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(config_content)?;

        if let Some(url) = &self.rpc_url_override {
            file_config.rpc.url = url.clone();
        }

        self.validate(&file_config)?;
        build_loaded_config(file_config)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if !matches!(config.rpc.url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "rpc url {} is not http(s)",
                config.rpc.url
            )));
        }
        if config.poller.interval_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "poller interval_secs must be positive".to_string(),
            ));
        }
        if config.poller.max_tracked_depth == Some(0) {
            return Err(ConfigError::ValidationError(
                "poller max_tracked_depth must be positive".to_string(),
            ));
        }
        if let Some(workflow) = &config.workflow {
            if workflow.invoice.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "workflow invoice must not be empty".to_string(),
                ));
            }
            if workflow.channel_value_sats == Some(0) {
                return Err(ConfigError::ValidationError(
                    "workflow channel_value_sats must be positive".to_string(),
                ));
            }
            if workflow.usable_poll_interval_ms == Some(0) {
                return Err(ConfigError::ValidationError(
                    "workflow usable_poll_interval_ms must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let funding = convert_funding(file_config.funding)?;

    let mut rpc = RpcConfig::new(file_config.rpc.url);
    rpc.username = file_config.rpc.username;
    rpc.password = file_config.rpc.password;
    rpc.wallet = Some(
        file_config
            .rpc
            .wallet
            .unwrap_or_else(|| funding.wallet_name.clone()),
    );
    rpc.timeout = Duration::from_secs(file_config.rpc.timeout_secs);

    let mut poller = PollerConfig::default();
    if let Some(secs) = file_config.poller.interval_secs {
        poller.interval = PollInterval::Fixed(Duration::from_secs(secs));
    }
    if let Some(height) = file_config.poller.anchor_height {
        poller.anchor = AnchorHeight::Height(height);
    }
    if let Some(depth) = file_config.poller.max_tracked_depth {
        poller.max_tracked_depth = depth;
    }

    let peers = file_config
        .simulation
        .peers
        .into_iter()
        .map(|p| {
            let address: PeerAddress = p.address.parse().map_err(|e| {
                ConfigError::ValidationError(format!("peer {}: {e}", p.label))
            })?;
            Ok(PeerEntry {
                label: p.label,
                address,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let workflow = file_config
        .workflow
        .map(|w| convert_workflow(w, &funding))
        .transpose()?;

    Ok(LoadedConfig {
        rpc,
        poller,
        funding,
        simulation: SimulationConfig {
            peers,
            pacing: Duration::from_secs(file_config.simulation.pacing_secs),
        },
        workflow,
    })
}

fn convert_workflow(
    w: file::WorkflowConfig,
    funding: &FundingConfig,
) -> Result<WorkflowConfig, ConfigError> {
    let peer: PeerAddress = w
        .peer
        .parse()
        .map_err(|e| ConfigError::ValidationError(format!("workflow peer {}: {e}", w.peer)))?;

    let mut workflow = WorkflowConfig::new(peer, w.invoice);
    workflow.funding = funding.clone();
    if let Some(sats) = w.channel_value_sats {
        workflow.channel.value_sats = sats;
    }
    if let Some(msat) = w.reserve_msat {
        workflow.channel.reserve_msat = msat;
    }
    if let Some(n) = w.confirmations {
        workflow.confirmations = n;
    }
    if let Some(secs) = w.peer_settle_secs {
        workflow.peer_settle_delay = Duration::from_secs(secs);
    }
    if let Some(ms) = w.usable_poll_interval_ms {
        workflow.usable_channel_poll_interval = Duration::from_millis(ms);
    }
    workflow.confirmation_deadline = w.confirmation_deadline_secs.map(Duration::from_secs);
    if let Some(secs) = w.observation_secs {
        workflow.observation_period = Duration::from_secs(secs);
    }
    Ok(workflow)
}

fn convert_funding(f: file::FundingConfig) -> Result<FundingConfig, ConfigError> {
    let mut funding = FundingConfig::default();
    if let Some(name) = f.wallet_name {
        funding.wallet_name = name;
    }
    if let Some(sats) = f.min_balance_sats {
        funding.min_wallet_balance_sats = sats;
    }
    if let Some(blocks) = f.maturity_blocks {
        funding.maturity_blocks = blocks;
    }
    if let Some(script) = f.disposable_script {
        funding.disposable_script = hex::decode(&script).map_err(|e| {
            ConfigError::ValidationError(format!("disposable_script {script}: {e}"))
        })?;
    }
    Ok(funding)
}
