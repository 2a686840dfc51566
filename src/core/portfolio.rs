//! Three-bucket portfolio simulation: seeded history, deposits, drift

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use super::config::{ConversionConvention, Redistribution};
use super::rates::ExchangeRateTable;

/// Half-width of the drift applied to every bucket on each tick.
pub const DRIFT_RANGE: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Bucket {
    #[default]
    Passive,
    Balanced,
    Aggressive,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Passive, Bucket::Aggressive, Bucket::Balanced];
}

impl Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Bucket::Passive => "Passive",
                Bucket::Balanced => "Balanced",
                Bucket::Aggressive => "Aggressive",
            }
        )
    }
}

impl FromStr for Bucket {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "passive" => Ok(Bucket::Passive),
            "balanced" => Ok(Bucket::Balanced),
            "aggressive" => Ok(Bucket::Aggressive),
            _ => Err(anyhow::anyhow!("Invalid portfolio type: {}", s)),
        }
    }
}

/// Deposit rejections surfaced to the user as alerts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DepositError {
    #[error("Please enter a valid amount.")]
    InvalidAmount(String),
    #[error("Exchange rate not available for selected currency.")]
    MissingRate(String),
    #[error("BTC to USD exchange rate not available.")]
    MissingBtcPrice,
    #[error("BTC deposits are disabled.")]
    BtcDisabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub period: String,
    pub passive: f64,
    pub aggressive: f64,
    pub balanced: f64,
}

impl PortfolioSnapshot {
    pub fn new(period: &str, passive: f64, aggressive: f64, balanced: f64) -> Self {
        PortfolioSnapshot {
            period: period.to_string(),
            passive,
            aggressive,
            balanced,
        }
    }

    pub fn get(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Passive => self.passive,
            Bucket::Balanced => self.balanced,
            Bucket::Aggressive => self.aggressive,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut f64 {
        match bucket {
            Bucket::Passive => &mut self.passive,
            Bucket::Balanced => &mut self.balanced,
            Bucket::Aggressive => &mut self.aggressive,
        }
    }

    pub fn total(&self) -> f64 {
        self.passive + self.aggressive + self.balanced
    }
}

/// Jan..May history every dashboard starts from.
pub fn seed_history() -> Vec<PortfolioSnapshot> {
    vec![
        PortfolioSnapshot::new("Jan", 1500.0, 2000.0, 1500.0),
        PortfolioSnapshot::new("Feb", 1400.0, 1800.0, 1300.0),
        PortfolioSnapshot::new("Mar", 1600.0, 2200.0, 1800.0),
        PortfolioSnapshot::new("Apr", 1700.0, 2300.0, 2100.0),
        PortfolioSnapshot::new("May", 1600.0, 2400.0, 1900.0),
    ]
}

/// Parses user input as a positive, finite amount.
pub fn parse_amount(raw: &str) -> Result<f64, DepositError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| DepositError::InvalidAmount(raw.to_string()))
}

/// Converts a fiat amount to USD under `convention`.
pub fn convert(
    raw_amount: &str,
    currency: &str,
    rates: &ExchangeRateTable,
    convention: ConversionConvention,
) -> Result<f64, DepositError> {
    let rate = rates
        .get(currency)
        .copied()
        .filter(|r| r.is_finite() && *r > 0.0)
        .ok_or_else(|| DepositError::MissingRate(currency.to_string()))?;
    let amount = parse_amount(raw_amount)?;

    let usd = match convention {
        ConversionConvention::Direct => amount * rate,
        ConversionConvention::Inverted => {
            // A missing USD or RUB entry compares false, as in the legacy screen
            let inverted = match (rates.get("USD"), rates.get("RUB")) {
                (Some(usd), Some(rub)) => usd > rub,
                _ => false,
            };
            let effective = if inverted { 1.0 / rate } else { rate };
            amount / effective
        }
    };
    debug!(amount, currency, usd, ?convention, "Converted deposit");
    Ok(usd)
}

pub fn convert_btc(raw_amount: &str, btc_usd: f64) -> Result<f64, DepositError> {
    if !(btc_usd.is_finite() && btc_usd > 0.0) {
        return Err(DepositError::MissingBtcPrice);
    }
    Ok(parse_amount(raw_amount)? * btc_usd)
}

/// The dashboard's portfolio. Totals are always derived from `history`, so
/// deposits and drift can never disagree about them.
#[derive(Debug, Clone)]
pub struct PortfolioEngine {
    history: Vec<PortfolioSnapshot>,
    selected: Bucket,
    redistribution: Redistribution,
}

impl Default for PortfolioEngine {
    fn default() -> Self {
        Self::new(Redistribution::default())
    }
}

impl PortfolioEngine {
    pub fn new(redistribution: Redistribution) -> Self {
        Self::with_history(seed_history(), redistribution)
    }

    pub fn with_history(history: Vec<PortfolioSnapshot>, redistribution: Redistribution) -> Self {
        PortfolioEngine {
            history,
            selected: Bucket::default(),
            redistribution,
        }
    }

    pub fn history(&self) -> &[PortfolioSnapshot] {
        &self.history
    }

    pub fn latest(&self) -> Option<&PortfolioSnapshot> {
        self.history.last()
    }

    pub fn selected(&self) -> Bucket {
        self.selected
    }

    pub fn select_bucket(&mut self, bucket: Bucket) {
        debug!(%bucket, "Selected portfolio type");
        self.selected = bucket;
    }

    /// Total asset value in USD: the latest snapshot's three buckets.
    pub fn total_asset_value(&self) -> f64 {
        self.latest().map_or(0.0, PortfolioSnapshot::total)
    }

    /// Every bucket of every snapshot added up.
    pub fn cumulative_value(&self) -> f64 {
        self.history.iter().map(PortfolioSnapshot::total).sum()
    }

    /// Per-bucket sum across history, in `Bucket::ALL` order.
    pub fn bucket_totals(&self) -> [(Bucket, f64); 3] {
        Bucket::ALL.map(|b| (b, self.history.iter().map(|s| s.get(b)).sum()))
    }

    pub fn selected_series(&self) -> Vec<(&str, f64)> {
        self.history
            .iter()
            .map(|s| (s.period.as_str(), s.get(self.selected)))
            .collect()
    }

    pub fn selected_value(&self) -> f64 {
        self.history.iter().map(|s| s.get(self.selected)).sum()
    }

    /// Spreads `amount_usd` over the latest snapshot.
    pub fn apply_deposit(&mut self, amount_usd: f64) {
        let redistribution = self.redistribution;
        let Some(latest) = self.history.last_mut() else {
            debug!("No snapshot to deposit into");
            return;
        };

        let old_total = latest.total();
        if old_total == 0.0 {
            for bucket in Bucket::ALL {
                *latest.get_mut(bucket) += amount_usd / 3.0;
            }
        } else {
            let divisor = match redistribution {
                Redistribution::Proportional => old_total,
                Redistribution::Legacy => old_total + amount_usd,
            };
            for bucket in Bucket::ALL {
                let share = latest.get(bucket) / divisor;
                *latest.get_mut(bucket) += amount_usd * share;
            }
        }
        debug!(
            amount_usd,
            old_total,
            new_total = latest.total(),
            "Applied deposit"
        );
    }

    /// One drift tick: every bucket of every snapshot moves by a whole
    /// number in `[-500, 500)`.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) {
        for snapshot in &mut self.history {
            for bucket in Bucket::ALL {
                let jitter = rng.gen_range(-DRIFT_RANGE..DRIFT_RANGE);
                *snapshot.get_mut(bucket) += f64::from(jitter);
            }
        }
        debug!(total = self.total_asset_value(), "Drift tick");
    }
}
