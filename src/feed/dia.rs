//! DIA quotation REST client
//!
//! `GET {base}/v1/quotation/{SYMBOL}` returns the feed's quotation document.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{FeederError, Result};
use crate::feed::QuotationSource;
use crate::types::{Asset, Quotation};

pub const DIA_BASE_URL: &str = "https://api.diadata.org";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DiaQuotation {
    symbol: String,
    #[serde(default)]
    name: String,
    price: f64,
    #[serde(default)]
    price_yesterday: Option<f64>,
    #[serde(default, rename = "VolumeYesterdayUSD")]
    volume_yesterday_usd: Option<f64>,
    time: DateTime<Utc>,
    #[serde(default)]
    source: String,
}

/// REST client for the DIA quotation endpoint
#[derive(Debug, Clone)]
pub struct DiaClient {
    client: Client,
    base_url: String,
}

impl DiaClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn quotation_url(&self, asset: &Asset) -> String {
        format!(
            "{}/v1/quotation/{}",
            self.base_url,
            asset.symbol().to_uppercase()
        )
    }
}

#[async_trait]
impl QuotationSource for DiaClient {
    fn name(&self) -> &'static str {
        "DIA"
    }

    async fn fetch_quotation(&self, asset: &Asset) -> Result<Quotation> {
        let url = self.quotation_url(asset);
        tracing::debug!(asset = %asset, url = %url, "Fetching quotation");

        let transport = |source| FeederError::FeedTransport {
            symbol: asset.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FeederError::FeedStatus {
                symbol: asset.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        decode_quotation(asset, &body)
    }
}

/// Decode a quotation document and check it carries a usable price
fn decode_quotation(asset: &Asset, body: &[u8]) -> Result<Quotation> {
    let raw: DiaQuotation =
        serde_json::from_slice(body).map_err(|e| FeederError::FeedDecode {
            symbol: asset.to_string(),
            reason: e.to_string(),
        })?;

    if !raw.price.is_finite() || raw.price <= 0.0 {
        return Err(FeederError::InvalidQuotation {
            symbol: asset.to_string(),
            price: raw.price,
        });
    }

    tracing::debug!(
        asset = %asset,
        feed_symbol = %raw.symbol,
        name = %raw.name,
        price = raw.price,
        price_yesterday = ?raw.price_yesterday,
        volume_yesterday_usd = ?raw.volume_yesterday_usd,
        source = %raw.source,
        time = %raw.time,
        "Decoded quotation"
    );

    // The feed echoes the symbol; the requested asset stays authoritative.
    Ok(Quotation {
        asset: asset.clone(),
        price: raw.price,
        time: raw.time,
    })
}
