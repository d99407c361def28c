//! Configuration management for the oracle feeder
//!
//! Layers, lowest to highest precedence: built-in defaults, `config/default`
//! and `config/local` files (or an explicit `--config` file), `FEEDER__*`
//! environment variables, command-line flags. A `.env` file has to be loaded
//! before the flags are parsed so their env aliases pick it up.

mod cli;

pub use cli::Cli;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use ethers::types::Address;
use serde::Deserialize;
use std::time::Duration;

use crate::feed::DIA_BASE_URL;
use crate::types::Asset;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub feeder: FeederConfig,
    pub chain: ChainConfig,
    pub deployment: DeploymentConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeederConfig {
    /// Symbols pushed to the oracle, processed in this order every cycle
    pub assets: Vec<String>,
    /// Relative change, in thousandths, that triggers an update
    pub deviation_permille: u32,
    /// Pause between two assets within one cycle
    pub sleep_seconds: u64,
    /// Interval between cycle starts
    pub frequency_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint of the blockchain node
    pub node_url: String,
    pub chain_id: u64,
    /// Address of an existing oracle; empty deploys a new one
    pub deployed_contract: String,
    /// Two-line file: key blob, passphrase
    pub secrets_file: String,
    /// Gas limit of every oracle write
    pub gas_limit: u64,
    /// Hex creation bytecode of the oracle, used only when deploying
    pub oracle_bytecode_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    /// Receipt polls before a deployment is considered lost
    pub confirm_attempts: u32,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from files, environment and command-line flags
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut builder = Config::builder()
            // Feeder defaults
            .set_default("feeder.assets", vec!["BTC", "MATIC", "ETH", "USDT", "XRP"])?
            .set_default("feeder.deviation_permille", 10)?
            .set_default("feeder.sleep_seconds", 10)?
            .set_default("feeder.frequency_seconds", 120)?
            // Chain defaults (Polygon mainnet)
            .set_default(
                "chain.node_url",
                "https://matic-mainnet-full-rpc.bwarelabs.com",
            )?
            .set_default("chain.chain_id", 137)?
            .set_default("chain.deployed_contract", "")?
            .set_default("chain.secrets_file", "/run/secrets/oracle_keys")?
            .set_default("chain.gas_limit", 1_000_725)?
            .set_default("chain.oracle_bytecode_file", "")?
            // Deployment confirmation defaults
            .set_default("deployment.confirm_attempts", 30)?
            .set_default("deployment.initial_backoff_secs", 2)?
            .set_default("deployment.max_backoff_secs", 30)?
            // Feed defaults
            .set_default("feed.base_url", DIA_BASE_URL)?
            .set_default("feed.request_timeout_secs", 30)?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false)),
        };

        let config = builder
            // Override with environment variables (FEEDER__SECTION__KEY)
            .add_source(
                Environment::with_prefix("FEEDER")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("feeder.assets")
                    .try_parsing(true),
            )
            // Command-line flags win over everything else
            .set_override_option("feeder.assets", cli.assets.clone())?
            .set_override_option("feeder.deviation_permille", cli.deviation_permille)?
            .set_override_option("feeder.sleep_seconds", cli.sleep_seconds)?
            .set_override_option("feeder.frequency_seconds", cli.frequency_seconds)?
            .set_override_option("chain.node_url", cli.blockchain_node.clone())?
            .set_override_option("chain.chain_id", cli.chain_id)?
            .set_override_option("chain.deployed_contract", cli.deployed_contract.clone())?
            .set_override_option("chain.secrets_file", cli.secrets_file.clone())?
            .set_override_option("chain.oracle_bytecode_file", cli.bytecode_file.clone())?
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject configurations the feeder cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.feeder.assets.iter().all(|a| a.trim().is_empty()) {
            bail!("feeder.assets must name at least one asset");
        }
        if self.feeder.frequency_seconds == 0 {
            bail!("feeder.frequency_seconds must be positive");
        }
        if self.chain.node_url.trim().is_empty() {
            bail!("chain.node_url must be set");
        }
        if self.deployment.confirm_attempts == 0 {
            bail!("deployment.confirm_attempts must be positive");
        }
        self.deployed_contract()?;
        Ok(())
    }

    /// Tracked assets in configured order, blanks and duplicates removed
    pub fn assets(&self) -> Vec<Asset> {
        let mut assets: Vec<Asset> = Vec::with_capacity(self.feeder.assets.len());
        for symbol in &self.feeder.assets {
            if symbol.trim().is_empty() {
                continue;
            }
            let asset = Asset::new(symbol);
            if !assets.contains(&asset) {
                assets.push(asset);
            }
        }
        assets
    }

    /// Parsed address of an existing oracle, `None` when one must be deployed
    pub fn deployed_contract(&self) -> Result<Option<Address>> {
        let raw = self.chain.deployed_contract.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let address = raw
            .parse::<Address>()
            .with_context(|| format!("Invalid chain.deployed_contract '{}'", raw))?;
        Ok(Some(address))
    }

    pub fn frequency(&self) -> Duration {
        Duration::from_secs(self.feeder.frequency_seconds)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.feeder.sleep_seconds)
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "assets={:?} deviation_permille={} frequency={}s sleep={}s chain_id={} node={} contract={}",
            self.feeder.assets,
            self.feeder.deviation_permille,
            self.feeder.frequency_seconds,
            self.feeder.sleep_seconds,
            self.chain.chain_id,
            self.chain.node_url,
            if self.chain.deployed_contract.is_empty() {
                "<deploy>"
            } else {
                self.chain.deployed_contract.as_str()
            }
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
