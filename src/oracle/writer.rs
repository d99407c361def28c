//! Builds and submits oracle `setValue` transactions

use ethers::types::{Address, U256};
use std::sync::Arc;

use crate::chain::{OracleContract, TxOptions};
use crate::error::{FeederError, Result};
use crate::oracle::GasEstimator;
use crate::types::{OracleWriteRequest, TxHandle};

/// Gas limit calibrated for the oracle's `setValue`
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_725;

pub struct OracleWriter {
    contract: Arc<dyn OracleContract>,
    gas: GasEstimator,
    from: Address,
    gas_limit: U256,
}

impl OracleWriter {
    pub fn new(
        contract: Arc<dyn OracleContract>,
        gas: GasEstimator,
        from: Address,
        gas_limit: u64,
    ) -> Self {
        Self {
            contract,
            gas,
            from,
            gas_limit: U256::from(gas_limit),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract.address()
    }

    /// Submit the write. Returns once the node accepted the transaction;
    /// mining is not awaited.
    pub async fn write(&self, request: &OracleWriteRequest) -> Result<TxHandle> {
        let value = u128::try_from(request.value)
            .map_err(|_| FeederError::PriceScale(request.value as f64))?;
        let timestamp = u128::try_from(request.timestamp).map_err(|_| {
            FeederError::Submission(format!("negative timestamp {}", request.timestamp))
        })?;

        let gas_price = self.gas.estimate().await?;
        let opts = TxOptions {
            from: self.from,
            gas_limit: Some(self.gas_limit),
            gas_price,
        };

        let tx = self
            .contract
            .set_value(opts, request.key.clone(), value, timestamp)
            .await?;

        tracing::info!(
            key = %request.key,
            value = request.value,
            timestamp = request.timestamp,
            gas_price = %gas_price,
            tx_hash = %format!("{:#x}", tx.hash),
            tx_to = ?tx.to,
            "📤 Oracle update submitted"
        );
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{MockLedger, MockOracleContract};
    use ethers::types::H256;

    fn gas_at(price: u64) -> GasEstimator {
        let mut ledger = MockLedger::new();
        ledger
            .expect_suggest_gas_price()
            .returning(move || Ok(U256::from(price)));
        GasEstimator::new(Arc::new(ledger))
    }

    fn request() -> OracleWriteRequest {
        OracleWriteRequest {
            key: "BTC/USD".to_string(),
            value: 6_712_345_000_000,
            timestamp: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_write_builds_transaction_options() {
        let from = Address::from_low_u64_be(7);
        let oracle = Address::from_low_u64_be(99);
        let mut contract = MockOracleContract::new();
        contract.expect_address().return_const(oracle);
        contract
            .expect_set_value()
            .withf(move |opts, key, value, timestamp| {
                opts.from == from
                    && opts.gas_limit == Some(U256::from(DEFAULT_GAS_LIMIT))
                    && opts.gas_price == U256::from(110u64)
                    && key == "BTC/USD"
                    && *value == 6_712_345_000_000u128
                    && *timestamp == 1_700_000_000u128
            })
            .times(1)
            .returning(move |_, _, _, _| {
                Ok(TxHandle {
                    hash: H256::from_low_u64_be(1),
                    to: Some(oracle),
                })
            });

        let writer = OracleWriter::new(Arc::new(contract), gas_at(100), from, DEFAULT_GAS_LIMIT);
        assert_eq!(writer.contract_address(), oracle);
        let tx = writer.write(&request()).await.unwrap();

        assert_eq!(tx.hash, H256::from_low_u64_be(1));
        assert_eq!(tx.to, Some(oracle));
    }

    #[tokio::test]
    async fn test_submission_failure_is_returned() {
        let mut contract = MockOracleContract::new();
        contract
            .expect_set_value()
            .returning(|_, _, _, _| Err(FeederError::Submission("nonce too low".into())));

        let writer = OracleWriter::new(
            Arc::new(contract),
            gas_at(100),
            Address::zero(),
            DEFAULT_GAS_LIMIT,
        );

        assert!(matches!(
            writer.write(&request()).await,
            Err(FeederError::Submission(_))
        ));
    }

    #[tokio::test]
    async fn test_gas_failure_skips_submission() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_suggest_gas_price()
            .returning(|| Err(FeederError::GasEstimate("timeout".into())));
        let mut contract = MockOracleContract::new();
        contract.expect_set_value().never();

        let writer = OracleWriter::new(
            Arc::new(contract),
            GasEstimator::new(Arc::new(ledger)),
            Address::zero(),
            DEFAULT_GAS_LIMIT,
        );

        assert!(matches!(
            writer.write(&request()).await,
            Err(FeederError::GasEstimate(_))
        ));
    }
}
