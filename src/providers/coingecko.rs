use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::rates::{CryptoPriceProvider, MarketQuote};

/// Crypto prices from the CoinGecko "simple price" API.
pub struct CoinGeckoProvider {
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str) -> Self {
        CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn simple_price(
        &self,
        asset_ids: &[&str],
        include_change: bool,
    ) -> Result<HashMap<String, SimplePrice>> {
        let ids = asset_ids.join(",");
        let mut url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies=usd",
            self.base_url, ids
        );
        if include_change {
            url.push_str("&include_24hr_change=true");
        }
        debug!("Requesting prices from {}", url);

        let client = reqwest::Client::builder().user_agent("tradex/1.0").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for assets: {}", e, ids))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for assets: {}",
                response.status(),
                ids
            ));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse price response for {}: {}", ids, e))
    }
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: f64,
    #[serde(default)]
    usd_24h_change: Option<f64>,
}

#[async_trait]
impl CryptoPriceProvider for CoinGeckoProvider {
    #[instrument(name = "CryptoPriceFetch", skip(self), fields(asset = %asset_id))]
    async fn fetch_price(&self, asset_id: &str) -> Result<f64> {
        let prices = self.simple_price(&[asset_id], false).await?;
        prices
            .get(asset_id)
            .map(|p| p.usd)
            .ok_or_else(|| anyhow!("No price data found for asset: {}", asset_id))
    }

    #[instrument(name = "CryptoMarketFetch", skip(self))]
    async fn fetch_market(&self, asset_ids: &[&str]) -> Result<Vec<MarketQuote>> {
        let prices = self.simple_price(asset_ids, true).await?;
        asset_ids
            .iter()
            .map(|id| {
                let price = prices
                    .get(*id)
                    .ok_or_else(|| anyhow!("No price data found for asset: {}", id))?;
                let change = price
                    .usd_24h_change
                    .ok_or_else(|| anyhow!("No 24h change found for asset: {}", id))?;
                Ok(MarketQuote::new(id, price.usd, change))
            })
            .collect()
    }
}
