//! JSON-RPC implementation of the chain capabilities
//!
//! One `SignerMiddleware` client signs every transaction with the feeder's
//! wallet; reads go through the same client.

use anyhow::{bail, Context};
use async_trait::async_trait;
use ethers::contract::{abigen, ContractFactory};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes, H256, U256};
use std::path::Path;
use std::sync::Arc;

use crate::chain::{Confirmation, Ledger, OracleContract, OracleDeployer, TxOptions};
use crate::error::{FeederError, Result};
use crate::secrets::SigningIdentity;
use crate::types::TxHandle;

abigen!(
    DiaOracleV2,
    r#"[
        function setValue(string key, uint128 value, uint128 timestamp)
    ]"#
);

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Build the signing client and make sure the node serves the configured chain
pub async fn connect(node_url: &str, identity: &SigningIdentity) -> anyhow::Result<Arc<SignerClient>> {
    let provider = Provider::<Http>::try_from(node_url)
        .with_context(|| format!("Invalid blockchain node URL '{}'", node_url))?;

    let remote_chain_id = provider
        .get_chainid()
        .await
        .with_context(|| format!("Failed to connect to the blockchain node at {}", node_url))?;
    if remote_chain_id != U256::from(identity.chain_id()) {
        bail!(
            "Node {} serves chain {}, expected {}",
            node_url,
            remote_chain_id,
            identity.chain_id()
        );
    }

    let client = SignerMiddleware::new(provider, identity.wallet().clone());
    Ok(Arc::new(client))
}

/// Read hex-encoded creation bytecode (optional 0x prefix)
pub fn load_bytecode(path: impl AsRef<Path>) -> anyhow::Result<Bytes> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read oracle bytecode from {}", path.display()))?;
    let trimmed = raw.trim();
    let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(hex_str)
        .with_context(|| format!("Oracle bytecode in {} is not valid hex", path.display()))?;
    if bytes.is_empty() {
        bail!("Oracle bytecode file {} is empty", path.display());
    }
    Ok(Bytes::from(bytes))
}

pub struct EthLedger {
    client: Arc<SignerClient>,
}

impl EthLedger {
    pub fn new(client: Arc<SignerClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Ledger for EthLedger {
    async fn suggest_gas_price(&self) -> Result<U256> {
        self.client
            .get_gas_price()
            .await
            .map_err(|e| FeederError::GasEstimate(e.to_string()))
    }

    async fn confirmation(&self, tx: H256) -> Result<Option<Confirmation>> {
        let receipt = self
            .client
            .get_transaction_receipt(tx)
            .await
            .map_err(|e| FeederError::Receipt(e.to_string()))?;

        Ok(receipt.map(|r| Confirmation {
            block_number: r.block_number.map(|b| b.as_u64()),
            contract_address: r.contract_address,
            // Pre-Byzantium receipts carry no status
            success: r.status.map(|s| s.as_u64() == 1).unwrap_or(true),
        }))
    }
}

pub struct EthOracle {
    inner: DiaOracleV2<SignerClient>,
}

impl EthOracle {
    pub fn new(address: Address, client: Arc<SignerClient>) -> Self {
        Self {
            inner: DiaOracleV2::new(address, client),
        }
    }
}

#[async_trait]
impl OracleContract for EthOracle {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn set_value(
        &self,
        opts: TxOptions,
        key: String,
        value: u128,
        timestamp: u128,
    ) -> Result<TxHandle> {
        let mut call = self
            .inner
            .set_value(key, value, timestamp)
            .legacy()
            .from(opts.from)
            .gas_price(opts.gas_price);
        if let Some(limit) = opts.gas_limit {
            call = call.gas(limit);
        }

        let pending = call
            .send()
            .await
            .map_err(|e| FeederError::Submission(e.to_string()))?;

        Ok(TxHandle {
            hash: pending.tx_hash(),
            to: Some(self.inner.address()),
        })
    }
}

pub struct EthDeployer {
    client: Arc<SignerClient>,
    bytecode: Option<Bytes>,
}

impl EthDeployer {
    /// `bytecode` is only needed when no deployed address is configured
    pub fn new(client: Arc<SignerClient>, bytecode: Option<Bytes>) -> Self {
        Self { client, bytecode }
    }
}

#[async_trait]
impl OracleDeployer for EthDeployer {
    async fn bind(&self, address: Address) -> Result<Arc<dyn OracleContract>> {
        let code = self
            .client
            .get_code(address, None)
            .await
            .map_err(|e| FeederError::Bind(e.to_string()))?;
        if code.0.is_empty() {
            return Err(FeederError::Bind(format!(
                "no contract code at {:#x}",
                address
            )));
        }

        Ok(Arc::new(EthOracle::new(address, self.client.clone())))
    }

    async fn deploy(&self, opts: TxOptions) -> Result<(Address, TxHandle)> {
        let bytecode = self
            .bytecode
            .clone()
            .ok_or_else(|| FeederError::Deploy("no oracle bytecode configured".to_string()))?;

        let factory = ContractFactory::new(DIAORACLEV2_ABI.clone(), bytecode, self.client.clone());
        let deployer = factory
            .deploy(())
            .map_err(|e| FeederError::Deploy(e.to_string()))?
            .legacy();

        let nonce = self
            .client
            .get_transaction_count(opts.from, None)
            .await
            .map_err(|e| FeederError::Deploy(e.to_string()))?;
        let address = ethers::utils::get_contract_address(opts.from, nonce);

        let mut tx = deployer.tx;
        tx.set_from(opts.from)
            .set_nonce(nonce)
            .set_gas_price(opts.gas_price);
        if let Some(limit) = opts.gas_limit {
            tx.set_gas(limit);
        }

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| FeederError::Deploy(e.to_string()))?;

        Ok((
            address,
            TxHandle {
                hash: pending.tx_hash(),
                to: None,
            },
        ))
    }
}
