//! Deposit modal state machine and the toast that reports its outcome

use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::config::ConversionConvention;
use super::portfolio::{self, DepositError, PortfolioEngine};
use super::rates::RateSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositKind {
    Fiat,
    Btc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    Open { amount: String },
}

/// One deposit modal. The fiat and BTC modals are two instances.
#[derive(Debug, Clone)]
pub struct DepositFlow {
    kind: DepositKind,
    state: ModalState,
    currency: String,
    convention: ConversionConvention,
}

impl DepositFlow {
    pub fn fiat(default_currency: &str, convention: ConversionConvention) -> Self {
        DepositFlow {
            kind: DepositKind::Fiat,
            state: ModalState::Closed,
            currency: default_currency.to_string(),
            convention,
        }
    }

    pub fn btc() -> Self {
        DepositFlow {
            kind: DepositKind::Btc,
            state: ModalState::Closed,
            currency: "BTC".to_string(),
            convention: ConversionConvention::Direct,
        }
    }

    pub fn kind(&self) -> DepositKind {
        self.kind
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open { .. })
    }

    pub fn amount(&self) -> Option<&str> {
        match &self.state {
            ModalState::Open { amount } => Some(amount),
            ModalState::Closed => None,
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Opens the modal with an empty amount.
    pub fn open(&mut self) {
        debug!(kind = ?self.kind, "Opening deposit modal");
        self.state = ModalState::Open {
            amount: String::new(),
        };
    }

    pub fn close(&mut self) {
        self.state = ModalState::Closed;
    }

    /// Edits the pending amount; ignored while closed.
    pub fn set_amount(&mut self, raw: &str) {
        if let ModalState::Open { amount } = &mut self.state {
            *amount = raw.trim().to_string();
        }
    }

    /// Picks the fiat currency. The BTC modal has no picker.
    pub fn select_currency(&mut self, code: &str) {
        if self.kind == DepositKind::Fiat {
            self.currency = code.trim().to_uppercase();
        }
    }

    /// USD equivalent shown under the input while typing; `None` when the
    /// amount cannot be priced yet.
    pub fn preview_usd(&self, rates: &RateSnapshot) -> Option<String> {
        let amount = self.amount()?;
        match self.kind {
            DepositKind::Fiat => {
                portfolio::convert(amount, &self.currency, &rates.fiat, self.convention)
                    .ok()
                    .map(|usd| format!("{usd:.4}"))
            }
            DepositKind::Btc => portfolio::convert_btc(amount, rates.btc_usd)
                .ok()
                .map(|usd| format!("USD {usd:.2}")),
        }
    }

    /// Commits the pending amount. A missing rate keeps the modal open so the
    /// user can pick another currency; every other outcome closes it.
    pub fn confirm(
        &mut self,
        engine: &mut PortfolioEngine,
        rates: &RateSnapshot,
    ) -> Result<String, DepositError> {
        let Some(raw) = self.amount().map(str::to_string) else {
            return Err(DepositError::InvalidAmount(String::new()));
        };

        let converted = match self.kind {
            DepositKind::Fiat => {
                portfolio::convert(&raw, &self.currency, &rates.fiat, self.convention)
            }
            DepositKind::Btc => portfolio::convert_btc(&raw, rates.btc_usd),
        };

        let usd = match converted {
            Ok(usd) => usd,
            Err(e @ (DepositError::MissingRate(_) | DepositError::MissingBtcPrice)) => {
                debug!(error = %e, "Deposit rejected, modal stays open");
                return Err(e);
            }
            Err(e) => {
                self.close();
                return Err(e);
            }
        };

        engine.apply_deposit(usd);
        self.close();

        let message = match self.kind {
            DepositKind::Fiat => format!(
                "Deposited {} {}, equivalent to USD {:.6}",
                raw, self.currency, usd
            ),
            DepositKind::Btc => format!("Deposited {raw} BTC, equivalent to USD {usd:.2}"),
        };
        info!("{}", message);
        Ok(message)
    }
}

/// Single toast slot; a newer message replaces the older one.
#[derive(Debug, Clone)]
pub struct Notification {
    message: Option<String>,
    visible_until: Option<Instant>,
    ttl: Duration,
}

impl Notification {
    pub fn new(ttl: Duration) -> Self {
        Notification {
            message: None,
            visible_until: None,
            ttl,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.visible_until = Some(now + self.ttl);
    }

    pub fn current(&self, now: Instant) -> Option<&str> {
        match (&self.message, self.visible_until) {
            (Some(message), Some(until)) if now < until => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::ExchangeRateTable;

    fn rates() -> RateSnapshot {
        RateSnapshot {
            fiat: ExchangeRateTable::from([("SGD".to_string(), 1.34)]),
            btc_usd: 60000.0,
        }
    }

    #[test]
    fn test_open_resets_amount() {
        let mut flow = DepositFlow::fiat("SGD", ConversionConvention::Direct);
        assert!(!flow.is_open());
        flow.set_amount("12");
        assert_eq!(flow.amount(), None);

        flow.open();
        flow.set_amount("12");
        assert_eq!(flow.amount(), Some("12"));
        flow.close();
        flow.open();
        assert_eq!(flow.amount(), Some(""));
    }

    #[test]
    fn test_fiat_deposit_scenario() {
        let mut engine = PortfolioEngine::default();
        let before = engine.total_asset_value();
        let mut flow = DepositFlow::fiat("SGD", ConversionConvention::Direct);

        flow.open();
        flow.set_amount("100");
        assert_eq!(flow.preview_usd(&rates()).as_deref(), Some("134.0000"));
        let message = flow.confirm(&mut engine, &rates()).unwrap();

        assert_eq!(
            message,
            "Deposited 100 SGD, equivalent to USD 134.000000"
        );
        assert!(!flow.is_open());
        assert!((engine.total_asset_value() - (before + 134.0)).abs() < 1e-9);
    }

    #[test]
    fn test_btc_deposit_scenario() {
        let mut engine = PortfolioEngine::default();
        let before = engine.total_asset_value();
        let mut flow = DepositFlow::btc();

        flow.open();
        flow.set_amount("0.5");
        assert_eq!(flow.preview_usd(&rates()).as_deref(), Some("USD 30000.00"));
        let message = flow.confirm(&mut engine, &rates()).unwrap();

        assert!(message.contains("30000.00"));
        assert!((engine.total_asset_value() - (before + 30000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_missing_rate_keeps_modal_open() {
        let mut engine = PortfolioEngine::default();
        let before = engine.history().to_vec();
        let mut flow = DepositFlow::fiat("SGD", ConversionConvention::Direct);

        flow.open();
        flow.select_currency("eur");
        flow.set_amount("100");
        assert_eq!(flow.currency(), "EUR");
        assert_eq!(flow.preview_usd(&rates()), None);

        let err = flow.confirm(&mut engine, &rates()).unwrap_err();
        assert_eq!(err, DepositError::MissingRate("EUR".to_string()));
        assert_eq!(
            err.to_string(),
            "Exchange rate not available for selected currency."
        );
        assert!(flow.is_open());
        assert_eq!(flow.amount(), Some("100"));
        assert_eq!(engine.history(), before.as_slice());
    }

    #[test]
    fn test_missing_btc_price_keeps_modal_open() {
        let mut engine = PortfolioEngine::default();
        let mut flow = DepositFlow::btc();
        let offline = RateSnapshot::default();

        flow.open();
        flow.set_amount("1");
        let err = flow.confirm(&mut engine, &offline).unwrap_err();
        assert_eq!(err, DepositError::MissingBtcPrice);
        assert!(flow.is_open());
    }

    #[test]
    fn test_invalid_amount_closes_modal() {
        let mut engine = PortfolioEngine::default();
        let before = engine.total_asset_value();
        let mut flow = DepositFlow::fiat("SGD", ConversionConvention::Direct);

        flow.open();
        flow.set_amount("-3");
        let err = flow.confirm(&mut engine, &rates()).unwrap_err();
        assert!(matches!(err, DepositError::InvalidAmount(_)));
        assert!(!flow.is_open());
        assert_eq!(engine.total_asset_value(), before);
    }

    #[test]
    fn test_confirm_while_closed_is_rejected() {
        let mut engine = PortfolioEngine::default();
        let mut flow = DepositFlow::btc();
        assert!(flow.confirm(&mut engine, &rates()).is_err());
    }

    #[test]
    fn test_btc_modal_ignores_currency_picker() {
        let mut flow = DepositFlow::btc();
        flow.select_currency("SGD");
        assert_eq!(flow.currency(), "BTC");
        assert_eq!(flow.kind(), DepositKind::Btc);
    }

    #[test]
    fn test_notification_expires() {
        let start = Instant::now();
        let mut toast = Notification::new(Duration::from_secs(5));
        assert_eq!(toast.current(start), None);

        toast.show("first", start);
        toast.show("second", start + Duration::from_secs(1));
        assert_eq!(toast.current(start + Duration::from_secs(1)), Some("second"));
        assert_eq!(toast.current(start + Duration::from_secs(5)), Some("second"));
        assert_eq!(toast.current(start + Duration::from_secs(6)), None);
    }
}
