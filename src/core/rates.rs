//! Rate and price abstractions plus the fetch-once client used by screens

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Asset id of bitcoin on the crypto price service.
pub const BTC_ASSET_ID: &str = "bitcoin";

/// Assets shown in the home screen market overview, in display order.
pub const MARKET_ASSETS: [&str; 3] = ["bitcoin", "ethereum", "cardano"];

/// Currency code -> rate. Ordered so currency pickers list codes stably.
pub type ExchangeRateTable = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketQuote {
    pub asset_id: String,
    pub name: String,
    pub price_usd: f64,
    pub change_24h_pct: f64,
}

impl MarketQuote {
    pub fn new(asset_id: &str, price_usd: f64, change_24h_pct: f64) -> Self {
        MarketQuote {
            asset_id: asset_id.to_string(),
            name: display_name(asset_id),
            price_usd,
            change_24h_pct,
        }
    }

    pub fn is_falling(&self) -> bool {
        self.change_24h_pct < 0.0
    }
}

/// "bitcoin" -> "Bitcoin"
fn display_name(asset_id: &str) -> String {
    let mut chars = asset_id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
pub trait FiatRateProvider: Send + Sync {
    async fn fetch_fiat_rates(&self) -> Result<ExchangeRateTable>;
}

#[async_trait]
pub trait CryptoPriceProvider: Send + Sync {
    /// Price of one unit of `asset_id` in USD.
    async fn fetch_price(&self, asset_id: &str) -> Result<f64>;

    /// USD price and 24h change for each asset, in the order requested.
    async fn fetch_market(&self, asset_ids: &[&str]) -> Result<Vec<MarketQuote>>;
}

/// Single-shot lookups with the dashboard's degrade policy: failures are
/// logged and replaced by an empty table or a zero price.
#[derive(Clone)]
pub struct RateClient {
    fiat: Arc<dyn FiatRateProvider>,
    crypto: Arc<dyn CryptoPriceProvider>,
}

impl RateClient {
    pub fn new(fiat: Arc<dyn FiatRateProvider>, crypto: Arc<dyn CryptoPriceProvider>) -> Self {
        RateClient { fiat, crypto }
    }

    pub async fn fiat_rates(&self) -> ExchangeRateTable {
        match self.fiat.fetch_fiat_rates().await {
            Ok(table) => {
                debug!(currencies = table.len(), "Fetched exchange rates");
                table
            }
            Err(e) => {
                error!(error = %e, "Error fetching exchange rates");
                ExchangeRateTable::new()
            }
        }
    }

    pub async fn btc_price(&self) -> f64 {
        match self.crypto.fetch_price(BTC_ASSET_ID).await {
            Ok(price) => {
                debug!(price, "Fetched BTC to USD rate");
                price
            }
            Err(e) => {
                error!(error = %e, "Error fetching BTC to USD rate");
                0.0
            }
        }
    }

    /// Both lookups, run concurrently.
    pub async fn snapshot(&self) -> RateSnapshot {
        let (fiat, btc_usd) = futures::future::join(self.fiat_rates(), self.btc_price()).await;
        RateSnapshot { fiat, btc_usd }
    }

    /// Market overview; errors are left to the caller, which keeps the
    /// previous quotes on failure.
    pub async fn market(&self) -> Result<Vec<MarketQuote>> {
        self.crypto.fetch_market(&MARKET_ASSETS).await
    }
}

/// Rates captured when a dashboard mounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSnapshot {
    pub fiat: ExchangeRateTable,
    pub btc_usd: f64,
}
