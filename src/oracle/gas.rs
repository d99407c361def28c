//! Gas price estimation for oracle writes

use ethers::types::U256;
use std::sync::Arc;

use crate::chain::Ledger;
use crate::error::{FeederError, Result};

/// Submitted gas price = suggested * 110 / 100, rounded down
const GAS_PRICE_MARGIN_PERCENT: u64 = 110;

/// Inflates the node's suggestion so the transaction survives price moves
/// between estimation and inclusion
#[derive(Clone)]
pub struct GasEstimator {
    ledger: Arc<dyn Ledger>,
}

impl GasEstimator {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    pub async fn estimate(&self) -> Result<U256> {
        let suggested = self.ledger.suggest_gas_price().await?;
        let adjusted = apply_margin(suggested)?;
        tracing::debug!(suggested = %suggested, adjusted = %adjusted, "Gas price estimated");
        Ok(adjusted)
    }
}

fn apply_margin(suggested: U256) -> Result<U256> {
    suggested
        .checked_mul(U256::from(GAS_PRICE_MARGIN_PERCENT))
        .map(|scaled| scaled / U256::from(100u64))
        .ok_or_else(|| FeederError::GasEstimate(format!("suggested gas price {} overflows", suggested)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockLedger;

    fn estimator_with(price: Result<U256>) -> GasEstimator {
        let mut ledger = MockLedger::new();
        let mut price = Some(price);
        ledger
            .expect_suggest_gas_price()
            .times(1)
            .returning(move || price.take().unwrap());
        GasEstimator::new(Arc::new(ledger))
    }

    #[tokio::test]
    async fn test_margin_is_ten_percent() {
        let estimator = estimator_with(Ok(U256::from(30_000_000_000u64)));
        assert_eq!(
            estimator.estimate().await.unwrap(),
            U256::from(33_000_000_000u64)
        );
    }

    #[tokio::test]
    async fn test_margin_truncates() {
        // 1_000_000_007 * 1.1 = 1_100_000_007.7
        let estimator = estimator_with(Ok(U256::from(1_000_000_007u64)));
        assert_eq!(
            estimator.estimate().await.unwrap(),
            U256::from(1_100_000_007u64)
        );

        let estimator = estimator_with(Ok(U256::from(9u64)));
        assert_eq!(estimator.estimate().await.unwrap(), U256::from(9u64));
    }

    #[tokio::test]
    async fn test_ledger_failure_is_propagated() {
        let estimator = estimator_with(Err(FeederError::GasEstimate("node down".into())));
        assert!(matches!(
            estimator.estimate().await,
            Err(FeederError::GasEstimate(_))
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(apply_margin(U256::MAX).is_err());
    }
}
