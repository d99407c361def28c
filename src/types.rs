//! Core types used throughout the feeder
//!
//! Defines assets, quotations and the on-chain write request.

use chrono::{DateTime, Utc};
use ethers::types::{Address, H256};
use std::fmt;

use crate::error::{FeederError, Result};

/// Fixed-point scale of on-chain oracle values (8 decimals)
pub const PRICE_SCALE: f64 = 100_000_000.0;

/// Quote currency appended to every oracle key
pub const QUOTE_CURRENCY: &str = "USD";

/// Tracked asset, identified by its upper-cased symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Asset(String);

impl Asset {
    pub fn new(symbol: &str) -> Self {
        Asset(symbol.trim().to_uppercase())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }

    /// Key under which the price is stored in the oracle (e.g., "BTC/USD")
    pub fn oracle_key(&self) -> String {
        format!("{}/{}", self.0, QUOTE_CURRENCY)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Asset {
    fn from(symbol: &str) -> Self {
        Asset::new(symbol)
    }
}

/// Single price observation from the external feed
#[derive(Debug, Clone, PartialEq)]
pub struct Quotation {
    pub asset: Asset,
    pub price: f64,
    /// Feed-side observation time
    pub time: DateTime<Utc>,
}

/// Payload of one oracle `setValue` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleWriteRequest {
    pub key: String,
    /// Price scaled by 10^8
    pub value: i64,
    /// Unix seconds at write time
    pub timestamp: i64,
}

impl OracleWriteRequest {
    /// Build the write for a quotation. The timestamp is the local clock at
    /// write time, not the feed's observation time.
    pub fn from_quotation(quotation: &Quotation, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            key: quotation.asset.oracle_key(),
            value: scale_price(quotation.price)?,
            timestamp: now.timestamp(),
        })
    }
}

/// Convert a float price into the oracle's 8-decimal integer representation
pub fn scale_price(price: f64) -> Result<i64> {
    let scaled = (price * PRICE_SCALE).round();
    if !scaled.is_finite() || scaled < 0.0 || scaled >= i64::MAX as f64 {
        return Err(FeederError::PriceScale(price));
    }
    Ok(scaled as i64)
}

/// Reference to a submitted (not necessarily mined) transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: H256,
    pub to: Option<Address>,
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to {
            Some(to) => write!(f, "{:#x} -> {:#x}", self.hash, to),
            None => write!(f, "{:#x}", self.hash),
        }
    }
}
