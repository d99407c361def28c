//! Quotation sources
//!
//! The feeder only needs "latest price for a symbol"; everything behind it
//! (transport, payload format) lives in the implementations.

mod dia;

pub use dia::{DiaClient, DIA_BASE_URL};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Asset, Quotation};

/// Trait for reference price feeds
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotationSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Fetch the latest quotation for an asset
    async fn fetch_quotation(&self, asset: &Asset) -> Result<Quotation>;
}
