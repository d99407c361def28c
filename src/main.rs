//! Oracle feeder entry point
//!
//! Startup failures (configuration, secrets, node connection, contract
//! provisioning) end the process with a non-zero status. Once the update
//! loop runs, errors are logged and the loop carries on.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oracle_feeder::chain::ethereum::{self, EthDeployer, EthLedger};
use oracle_feeder::chain::Ledger;
use oracle_feeder::config::{AppConfig, Cli, LoggingConfig};
use oracle_feeder::feed::DiaClient;
use oracle_feeder::oracle::{
    ConfirmationPolicy, ContractProvisioner, DeviationMonitor, GasEstimator, OracleWriter,
    Scheduler,
};
use oracle_feeder::secrets::SigningIdentity;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::load(&cli)?;
    init_tracing(&config.logging);

    info!(version = env!("CARGO_PKG_VERSION"), config = %config, "Starting oracle feeder");

    let identity = SigningIdentity::load(&config.chain.secrets_file, config.chain.chain_id)
        .context("Failed to load signing identity")?;
    info!(account = %format!("{:#x}", identity.address()), "🔑 Signing identity unlocked");

    let client = ethereum::connect(&config.chain.node_url, &identity).await?;
    info!(node = %config.chain.node_url, chain_id = config.chain.chain_id, "🔗 Connected to blockchain node");
    let ledger: Arc<dyn Ledger> = Arc::new(EthLedger::new(client.clone()));

    let existing = config.deployed_contract()?;
    let bytecode = match existing {
        Some(_) => None,
        None => Some(
            ethereum::load_bytecode(&config.chain.oracle_bytecode_file)
                .context("No deployed contract configured and no oracle bytecode to deploy")?,
        ),
    };
    let provisioner = ContractProvisioner::new(
        Arc::new(EthDeployer::new(client, bytecode)),
        ledger.clone(),
        identity.address(),
        ConfirmationPolicy::from(&config.deployment),
    );
    let contract = provisioner
        .resolve(existing)
        .await
        .context("Failed to deploy or bind contract")?;

    let writer = OracleWriter::new(
        contract,
        GasEstimator::new(ledger),
        identity.address(),
        config.chain.gas_limit,
    );
    info!(
        contract = %format!("{:#x}", writer.contract_address()),
        gas_limit = config.chain.gas_limit,
        "📝 Oracle writer ready"
    );
    let source = DiaClient::new(
        &config.feed.base_url,
        Duration::from_secs(config.feed.request_timeout_secs),
    )?;
    let mut monitor =
        DeviationMonitor::new(Arc::new(source), writer, config.feeder.deviation_permille);
    let scheduler = Scheduler::new(config.assets(), config.frequency(), config.pacing());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive so the loop is not stopped by a closed channel
                warn!(error = %e, "Failed to listen for ctrl-c; running until killed");
                std::future::pending::<()>().await;
            }
        }
    });

    scheduler.run(&mut monitor, shutdown_rx).await;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let json = logging.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}
