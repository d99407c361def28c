//! Ledger and oracle-contract capabilities
//!
//! The feeder talks to the blockchain only through these traits; the
//! `ethereum` module provides the JSON-RPC implementation.

pub mod ethereum;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::sync::Arc;

use crate::error::Result;
use crate::types::TxHandle;

/// Transaction options of a contract call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    pub from: Address,
    /// `None` lets the node estimate
    pub gas_limit: Option<U256>,
    pub gas_price: U256,
}

/// Mined state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub block_number: Option<u64>,
    /// Set for contract creations
    pub contract_address: Option<Address>,
    pub success: bool,
}

/// Node-level operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Gas price currently suggested by the node
    async fn suggest_gas_price(&self) -> Result<U256>;

    /// Receipt of a transaction, `None` while it is not mined
    async fn confirmation(&self, tx: H256) -> Result<Option<Confirmation>>;
}

/// Write side of the deployed oracle
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OracleContract: Send + Sync {
    fn address(&self) -> Address;

    /// Submit `setValue(key, value, timestamp)` without waiting for it to be mined
    async fn set_value(
        &self,
        opts: TxOptions,
        key: String,
        value: u128,
        timestamp: u128,
    ) -> Result<TxHandle>;
}

/// Obtains oracle handles: attach to a deployment or create one
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OracleDeployer: Send + Sync {
    async fn bind(&self, address: Address) -> Result<Arc<dyn OracleContract>>;

    /// Broadcast a creation transaction; returns the future contract address
    async fn deploy(&self, opts: TxOptions) -> Result<(Address, TxHandle)>;
}
