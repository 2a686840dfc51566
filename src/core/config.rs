use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable that overrides `providers.freecurrency.api_key`.
pub const FIAT_API_KEY_ENV: &str = "TRADEX_FIAT_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FreeCurrencyProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for FreeCurrencyProviderConfig {
    fn default() -> Self {
        FreeCurrencyProviderConfig {
            base_url: "https://api.freecurrencyapi.com".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
}

impl Default for CoinGeckoProviderConfig {
    fn default() -> Self {
        CoinGeckoProviderConfig {
            base_url: "https://api.coingecko.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub freecurrency: FreeCurrencyProviderConfig,
    #[serde(default)]
    pub coingecko: CoinGeckoProviderConfig,
}

/// How a fiat rate table is turned into USD.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversionConvention {
    /// Table entries are USD per one unit of the foreign currency:
    /// `usd = amount * rate`.
    #[default]
    Direct,
    /// Table entries are foreign units per USD, flipped when `USD > RUB`:
    /// `usd = amount / effective_rate`. Kept for parity with the legacy
    /// dashboard only.
    Inverted,
}

/// How a deposit is spread over the latest snapshot's buckets.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Redistribution {
    /// Each bucket grows by its share of the pre-deposit total.
    #[default]
    Proportional,
    /// Each bucket grows by `amount * bucket / (total + amount)`, which loses
    /// part of the deposit. Legacy parity only.
    Legacy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub conversion: ConversionConvention,
    pub redistribution: Redistribution,
    pub enable_btc_deposit: bool,
    pub enable_loan_ledger: bool,
    pub default_currency: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            conversion: ConversionConvention::Direct,
            redistribution: Redistribution::Proportional,
            enable_btc_deposit: true,
            enable_loan_ledger: true,
            default_currency: "SGD".to_string(),
        }
    }
}

/// Timer cadences in milliseconds.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub drift_ms: u64,
    pub shipment_ms: u64,
    pub news_ms: u64,
    pub market_refresh_ms: u64,
    pub notification_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            drift_ms: 3000,
            shipment_ms: 3000,
            news_ms: 5000,
            market_refresh_ms: 10000,
            notification_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults
    /// when none has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "tradex", "tradex")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// API key for the fiat rate service. The environment wins over the file.
    pub fn fiat_api_key(&self) -> Option<String> {
        std::env::var(FIAT_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.providers.freecurrency.api_key.clone())
    }
}
