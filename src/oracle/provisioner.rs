//! Oracle contract provisioning
//!
//! Binds to a configured deployment, or deploys a fresh oracle and polls for
//! its receipt before any write is attempted against it.

use ethers::types::{Address, H256};
use std::sync::Arc;
use std::time::Duration;

use crate::chain::{Confirmation, Ledger, OracleContract, OracleDeployer, TxOptions};
use crate::config::DeploymentConfig;
use crate::error::{FeederError, Result};
use crate::oracle::GasEstimator;

/// Bounded exponential backoff for receipt polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl From<&DeploymentConfig> for ConfirmationPolicy {
    fn from(cfg: &DeploymentConfig) -> Self {
        Self {
            max_attempts: cfg.confirm_attempts,
            initial_backoff: Duration::from_secs(cfg.initial_backoff_secs),
            max_backoff: Duration::from_secs(cfg.max_backoff_secs),
        }
    }
}

/// Poll until `tx` is mined. Receipt query errors count as a failed attempt.
pub async fn await_confirmation(
    ledger: &dyn Ledger,
    tx: H256,
    policy: &ConfirmationPolicy,
) -> Result<Confirmation> {
    let mut backoff = policy.initial_backoff.min(policy.max_backoff);

    for attempt in 1..=policy.max_attempts {
        match ledger.confirmation(tx).await {
            Ok(Some(confirmation)) if confirmation.success => return Ok(confirmation),
            Ok(Some(_)) => return Err(FeederError::DeployReverted(tx)),
            Ok(None) => {
                tracing::debug!(tx_hash = %format!("{:#x}", tx), attempt, "Transaction not mined yet");
            }
            Err(e) => {
                tracing::warn!(tx_hash = %format!("{:#x}", tx), attempt, error = %e, "Receipt query failed");
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2).min(policy.max_backoff);
        }
    }

    Err(FeederError::DeployTimeout {
        tx,
        attempts: policy.max_attempts,
    })
}

pub struct ContractProvisioner {
    deployer: Arc<dyn OracleDeployer>,
    ledger: Arc<dyn Ledger>,
    gas: GasEstimator,
    from: Address,
    policy: ConfirmationPolicy,
}

impl ContractProvisioner {
    pub fn new(
        deployer: Arc<dyn OracleDeployer>,
        ledger: Arc<dyn Ledger>,
        from: Address,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            gas: GasEstimator::new(ledger.clone()),
            deployer,
            ledger,
            from,
            policy,
        }
    }

    /// Handle to the oracle: the existing deployment when given, otherwise a
    /// newly deployed and mined instance
    pub async fn resolve(&self, existing: Option<Address>) -> Result<Arc<dyn OracleContract>> {
        if let Some(address) = existing {
            let contract = self.deployer.bind(address).await?;
            tracing::info!(contract = %format!("{:#x}", address), "🔗 Bound to deployed oracle");
            return Ok(contract);
        }

        let gas_price = self.gas.estimate().await?;
        let opts = TxOptions {
            from: self.from,
            gas_limit: None,
            gas_price,
        };
        let (predicted, tx) = self.deployer.deploy(opts).await?;
        tracing::info!(
            contract = %format!("{:#x}", predicted),
            tx_hash = %format!("{:#x}", tx.hash),
            "Contract pending deploy, waiting to be mined"
        );

        let confirmation = await_confirmation(self.ledger.as_ref(), tx.hash, &self.policy).await?;
        let address = confirmation.contract_address.unwrap_or(predicted);
        if address != predicted {
            tracing::warn!(
                predicted = %format!("{:#x}", predicted),
                actual = %format!("{:#x}", address),
                "Deployed address differs from prediction"
            );
        }

        tracing::info!(
            contract = %format!("{:#x}", address),
            block = ?confirmation.block_number,
            "✅ Oracle deployed"
        );
        self.deployer.bind(address).await
    }
}
