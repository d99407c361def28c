//! Deviation-triggered update decision per asset
//!
//! Holds the last price pushed on-chain for every asset. A new quotation is
//! written only when it leaves the band `old * (1 ± permille / 1000)`; the
//! stored price moves only after the write was accepted by the node.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::feed::QuotationSource;
use crate::oracle::OracleWriter;
use crate::types::{Asset, OracleWriteRequest, TxHandle};

/// Result of one asset check
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Quotation stayed inside the band
    Unchanged { previous: f64, price: f64 },
    /// Quotation left the band and a write was submitted
    Updated {
        previous: f64,
        price: f64,
        tx: TxHandle,
    },
}

impl CheckOutcome {
    pub fn updated(&self) -> bool {
        matches!(self, CheckOutcome::Updated { .. })
    }
}

/// True when `new` lies strictly outside `old * (1 ± permille / 1000)`.
/// With `old == 0` any positive price qualifies.
pub fn exceeds_deviation(old: f64, new: f64, deviation_permille: u32) -> bool {
    let band = f64::from(deviation_permille) / 1000.0;
    new > old * (1.0 + band) || new < old * (1.0 - band)
}

pub struct DeviationMonitor {
    source: Arc<dyn QuotationSource>,
    writer: OracleWriter,
    deviation_permille: u32,
    /// Last price pushed on-chain; absent means never pushed
    prices: HashMap<Asset, f64>,
}

impl DeviationMonitor {
    pub fn new(source: Arc<dyn QuotationSource>, writer: OracleWriter, deviation_permille: u32) -> Self {
        Self {
            source,
            writer,
            deviation_permille,
            prices: HashMap::new(),
        }
    }

    /// Last price pushed for `asset`, 0 if none yet
    pub fn last_price(&self, asset: &Asset) -> f64 {
        self.prices.get(asset).copied().unwrap_or(0.0)
    }

    /// Fetch, compare and, if needed, write. On any error the stored price
    /// for `asset` is left untouched.
    pub async fn check(&mut self, asset: &Asset) -> Result<CheckOutcome> {
        let quotation = self.source.fetch_quotation(asset).await?;
        let previous = self.last_price(asset);
        let price = quotation.price;

        tracing::info!(
            asset = %asset,
            source = self.source.name(),
            price = price,
            previous = previous,
            "Quotation fetched"
        );

        if !exceeds_deviation(previous, price, self.deviation_permille) {
            return Ok(CheckOutcome::Unchanged { previous, price });
        }

        tracing::info!(
            asset = %asset,
            previous = previous,
            price = price,
            deviation_permille = self.deviation_permille,
            "Entering deviation based update zone"
        );

        let request = OracleWriteRequest::from_quotation(&quotation, Utc::now())?;
        let tx = self.writer.write(&request).await?;
        self.prices.insert(asset.clone(), price);

        Ok(CheckOutcome::Updated { previous, price, tx })
    }
}
