//! Error types shared by the feeder pipeline

use std::path::PathBuf;

use ethers::types::H256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeederError {
    #[error("Failed to read secrets file {path}: {source}")]
    SecretsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secrets file should have exactly two lines, found {0}")]
    MalformedSecrets(usize),

    #[error("Failed to unlock signing key: {0}")]
    SigningKey(String),

    #[error("Quotation request for {symbol} failed: {source}")]
    FeedTransport {
        symbol: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Error on quotation api for {symbol} with return code {status}")]
    FeedStatus { symbol: String, status: u16 },

    #[error("Failed to decode quotation for {symbol}: {reason}")]
    FeedDecode { symbol: String, reason: String },

    #[error("Invalid quotation for {symbol}: price {price}")]
    InvalidQuotation { symbol: String, price: f64 },

    #[error("Cannot scale price {0} to an on-chain integer")]
    PriceScale(f64),

    #[error("Failed to obtain gas price: {0}")]
    GasEstimate(String),

    #[error("Failed to submit transaction: {0}")]
    Submission(String),

    #[error("Failed to query transaction receipt: {0}")]
    Receipt(String),

    #[error("Failed to bind oracle contract: {0}")]
    Bind(String),

    #[error("Failed to deploy oracle contract: {0}")]
    Deploy(String),

    #[error("Deployment {tx:#x} not confirmed after {attempts} attempts")]
    DeployTimeout { tx: H256, attempts: u32 },

    #[error("Deployment {0:#x} reverted")]
    DeployReverted(H256),
}

pub type Result<T> = std::result::Result<T, FeederError>;
