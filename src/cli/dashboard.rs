use super::input::{self, Screen, expect_args};
use super::ui;
use crate::core::config::AppConfig;
use crate::core::deposit::{DepositFlow, DepositKind, Notification};
use crate::core::portfolio::{Bucket, DepositError, PortfolioEngine};
use crate::core::rates::{RateClient, RateSnapshot};
use crate::core::schedule::{ScopedTask, Ticker};
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use futures::future::OptionFuture;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info};

const HELP: &str = "Commands: fx | btc | amount <value> | currency <code> | confirm | close | \
deposit <amount> <currency> | deposit-btc <amount> | select <passive|balanced|aggressive> | \
rates | show | theme | home | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCommand {
    OpenFiat,
    OpenBtc,
    Amount(String),
    Currency(String),
    Confirm,
    Close,
    Deposit { amount: String, currency: String },
    DepositBtc(String),
    Select(Bucket),
    Rates,
    Show,
    Theme,
    Home,
    Help,
    Quit,
}

impl FromStr for DashboardCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let (verb, args) = input::split(line).ok_or_else(|| anyhow!("{}", HELP))?;
        let command = match verb.as_str() {
            "fx" => DashboardCommand::OpenFiat,
            "btc" => DashboardCommand::OpenBtc,
            "amount" => {
                let [value] = expect_args(&args, "amount <value>")?;
                DashboardCommand::Amount(value.to_string())
            }
            "currency" => {
                let [code] = expect_args(&args, "currency <code>")?;
                DashboardCommand::Currency(code.to_string())
            }
            "confirm" => DashboardCommand::Confirm,
            "close" => DashboardCommand::Close,
            "deposit" => {
                let [amount, currency] = expect_args(&args, "deposit <amount> <currency>")?;
                DashboardCommand::Deposit {
                    amount: amount.to_string(),
                    currency: currency.to_string(),
                }
            }
            "deposit-btc" => {
                let [amount] = expect_args(&args, "deposit-btc <amount>")?;
                DashboardCommand::DepositBtc(amount.to_string())
            }
            "select" => {
                let [bucket] = expect_args(&args, "select <passive|balanced|aggressive>")?;
                DashboardCommand::Select(bucket.parse()?)
            }
            "rates" => DashboardCommand::Rates,
            "show" => DashboardCommand::Show,
            "theme" => DashboardCommand::Theme,
            "home" => DashboardCommand::Home,
            "help" => DashboardCommand::Help,
            "quit" | "exit" => DashboardCommand::Quit,
            other => return Err(anyhow!("Unknown command: {}. {}", other, HELP)),
        };
        Ok(command)
    }
}

/// What the screen loop should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Print(String),
    Alert(String),
    Navigate(Screen),
    Quit,
}

/// Trading dashboard state: portfolio, both deposit modals, rates and toast.
pub struct Dashboard {
    engine: PortfolioEngine,
    fiat: DepositFlow,
    btc: Option<DepositFlow>,
    active: Option<DepositKind>,
    rates: RateSnapshot,
    rates_loaded: bool,
    toast: Notification,
    rng: StdRng,
}

impl Dashboard {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &AppConfig, rng: StdRng) -> Self {
        let dashboard = &config.dashboard;
        Dashboard {
            engine: PortfolioEngine::new(dashboard.redistribution),
            fiat: DepositFlow::fiat(&dashboard.default_currency, dashboard.conversion),
            btc: dashboard.enable_btc_deposit.then(DepositFlow::btc),
            active: None,
            rates: RateSnapshot::default(),
            rates_loaded: false,
            toast: Notification::new(Duration::from_millis(config.schedule.notification_ms)),
            rng,
        }
    }

    pub fn engine(&self) -> &PortfolioEngine {
        &self.engine
    }

    pub fn set_rates(&mut self, rates: RateSnapshot) {
        debug!(
            currencies = rates.fiat.len(),
            btc_usd = rates.btc_usd,
            "Dashboard rates loaded"
        );
        self.rates = rates;
        self.rates_loaded = true;
    }

    pub fn drift(&mut self) {
        self.engine.tick(&mut self.rng);
    }

    fn modal(&mut self, kind: DepositKind) -> Option<&mut DepositFlow> {
        match kind {
            DepositKind::Fiat => Some(&mut self.fiat),
            DepositKind::Btc => self.btc.as_mut(),
        }
    }

    fn active_modal(&mut self) -> Option<&mut DepositFlow> {
        let kind = self.active?;
        self.modal(kind).filter(|m| m.is_open())
    }

    fn open(&mut self, kind: DepositKind) -> Result<(), DepositError> {
        let modal = self.modal(kind).ok_or(DepositError::BtcDisabled)?;
        modal.open();
        self.active = Some(kind);
        Ok(())
    }

    fn confirm_active(&mut self, now: Instant) -> Flow {
        let Some(kind) = self.active else {
            return Flow::Alert("No deposit window is open.".to_string());
        };
        let result = match kind {
            DepositKind::Fiat => self.fiat.confirm(&mut self.engine, &self.rates),
            DepositKind::Btc => match self.btc.as_mut() {
                Some(btc) => btc.confirm(&mut self.engine, &self.rates),
                None => Err(DepositError::BtcDisabled),
            },
        };
        match result {
            Ok(message) => {
                self.active = None;
                self.toast.show(message, now);
                Flow::Print(self.render(now))
            }
            Err(e) => {
                if self.active_modal().is_none() {
                    self.active = None;
                }
                Flow::Alert(e.to_string())
            }
        }
    }

    pub fn handle(&mut self, command: DashboardCommand, now: Instant) -> Flow {
        match command {
            DashboardCommand::OpenFiat | DashboardCommand::OpenBtc => {
                let kind = if command == DashboardCommand::OpenFiat {
                    DepositKind::Fiat
                } else {
                    DepositKind::Btc
                };
                match self.open(kind) {
                    Ok(()) => Flow::Print(self.render_modal()),
                    Err(e) => Flow::Alert(e.to_string()),
                }
            }
            DashboardCommand::Amount(value) => match self.active_modal() {
                Some(modal) => {
                    modal.set_amount(&value);
                    Flow::Print(self.render_modal())
                }
                None => Flow::Alert("No deposit window is open.".to_string()),
            },
            DashboardCommand::Currency(code) => {
                self.fiat.select_currency(&code);
                Flow::Print(self.render_modal())
            }
            DashboardCommand::Confirm => self.confirm_active(now),
            DashboardCommand::Close => {
                if let Some(modal) = self.active_modal() {
                    modal.close();
                }
                self.active = None;
                Flow::Print(self.render(now))
            }
            DashboardCommand::Deposit { amount, currency } => {
                self.fiat.open();
                self.fiat.select_currency(&currency);
                self.fiat.set_amount(&amount);
                self.active = Some(DepositKind::Fiat);
                self.confirm_active(now)
            }
            DashboardCommand::DepositBtc(amount) => {
                if let Err(e) = self.open(DepositKind::Btc) {
                    return Flow::Alert(e.to_string());
                }
                if let Some(btc) = self.btc.as_mut() {
                    btc.set_amount(&amount);
                }
                self.confirm_active(now)
            }
            DashboardCommand::Select(bucket) => {
                self.engine.select_bucket(bucket);
                Flow::Print(self.render_selected())
            }
            DashboardCommand::Rates => Flow::Print(self.render_rates()),
            DashboardCommand::Show => Flow::Print(self.render(now)),
            DashboardCommand::Theme => {
                let theme = ui::toggle_theme();
                Flow::Print(format!("Switched to {theme} theme."))
            }
            DashboardCommand::Home => Flow::Navigate(Screen::Home),
            DashboardCommand::Help => Flow::Print(HELP.to_string()),
            DashboardCommand::Quit => Flow::Quit,
        }
    }

    pub fn render_total(&self) -> String {
        format!(
            "{} {}",
            ui::style_text("Overview Asset Value", ui::StyleType::TotalLabel),
            ui::style_text(
                &format!("Total: USD {:.2}", self.engine.total_asset_value()),
                ui::StyleType::TotalValue
            )
        )
    }

    fn render_selected(&self) -> String {
        let bucket = self.engine.selected();
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Period"), ui::header_cell(&bucket.to_string())]);
        for (period, value) in self.engine.selected_series() {
            table.add_row(vec![Cell::new(period), ui::amount_cell(value)]);
        }
        format!(
            "{}\n{}\nTotal {}: USD {:.2}",
            ui::style_text(&format!("{bucket} Portfolio Performance"), ui::StyleType::Title),
            table,
            bucket,
            self.engine.selected_value()
        )
    }

    fn render_rates(&self) -> String {
        if !self.rates_loaded {
            return ui::style_text("Loading exchange rates...", ui::StyleType::Subtle);
        }
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Rate")]);
        for (code, rate) in &self.rates.fiat {
            table.add_row(vec![Cell::new(code), Cell::new(format!("{rate:.6}"))]);
        }
        let btc = if self.rates.btc_usd > 0.0 {
            format!("BTC/USD: {:.2}", self.rates.btc_usd)
        } else {
            "BTC/USD: unavailable".to_string()
        };
        format!("{table}\n{btc}")
    }

    pub fn render_modal(&self) -> String {
        let modal = match self.active {
            Some(DepositKind::Fiat) => Some(&self.fiat),
            Some(DepositKind::Btc) => self.btc.as_ref(),
            None => None,
        };
        let Some(modal) = modal.filter(|m| m.is_open()) else {
            return ui::style_text("No deposit window open.", ui::StyleType::Subtle);
        };
        let amount = modal.amount().unwrap_or_default();
        let preview = modal
            .preview_usd(&self.rates)
            .unwrap_or_else(|| "-".to_string());
        match modal.kind() {
            DepositKind::Fiat => format!(
                "{}\nCurrency: {}\nAmount: {}\nEquivalent in USD: {}",
                ui::style_text("Deposit Forex Amount", ui::StyleType::Title),
                modal.currency(),
                amount,
                preview
            ),
            DepositKind::Btc => format!(
                "{}\nAmount: {} BTC\nEquivalent in USD: {}",
                ui::style_text("Deposit BTC Amount", ui::StyleType::Title),
                amount,
                preview
            ),
        }
    }

    pub fn render(&self, now: Instant) -> String {
        let mut output = format!(
            "{}\n\n{}\n{}\n\n",
            ui::style_text("Trading Dashboard", ui::StyleType::Title),
            self.render_total(),
            ui::style_text(
                &format!(
                    "Market volume across all periods: USD {:.2}",
                    self.engine.cumulative_value()
                ),
                ui::StyleType::Subtle
            )
        );

        let mut history = ui::new_styled_table();
        history.set_header(vec![
            ui::header_cell("Period"),
            ui::header_cell("Passive"),
            ui::header_cell("Aggressive"),
            ui::header_cell("Balanced"),
        ]);
        for snapshot in self.engine.history() {
            history.add_row(vec![
                Cell::new(&snapshot.period),
                ui::amount_cell(snapshot.passive),
                ui::amount_cell(snapshot.aggressive),
                ui::amount_cell(snapshot.balanced),
            ]);
        }
        output.push_str(&format!(
            "{}\n{}\n\n",
            ui::style_text("Overall Market Performance", ui::StyleType::Title),
            history
        ));

        let totals = self.engine.bucket_totals();
        let grand: f64 = totals.iter().map(|(_, v)| v).sum();
        let mut distribution = ui::new_styled_table();
        distribution.set_header(vec![
            ui::header_cell("Portfolio"),
            ui::header_cell("Value"),
            ui::header_cell("Share (%)"),
        ]);
        for (bucket, value) in totals {
            let share = if grand != 0.0 { value / grand * 100.0 } else { 0.0 };
            distribution.add_row(vec![
                Cell::new(bucket.to_string()),
                ui::amount_cell(value),
                ui::amount_cell(share),
            ]);
        }
        output.push_str(&format!(
            "{}\n{}\n\n",
            ui::style_text("Portfolio Distribution", ui::StyleType::Title),
            distribution
        ));

        output.push_str(&self.render_selected());

        if self.active.is_some() {
            output.push_str("\n\n");
            output.push_str(&self.render_modal());
        }
        if let Some(message) = self.toast.current(now) {
            output.push_str("\n\n");
            output.push_str(&ui::style_text(message, ui::StyleType::Notice));
        }
        output
    }
}

/// Runs the dashboard until `quit`, `home` or end of input. Rates load in
/// the background; deposits made before they arrive are rejected like any
/// other missing rate.
pub async fn run<R>(config: &AppConfig, client: RateClient, input: &mut R) -> Result<Option<Screen>>
where
    R: AsyncBufRead + Unpin,
{
    info!("Mounting trading dashboard");
    let mut view = Dashboard::new(config);
    let mut lines = input.lines();
    let mut drift = Ticker::from_millis(config.schedule.drift_ms);
    let mut rates_task = Some(ScopedTask::spawn(async move { client.snapshot().await }));

    println!("{}\n{}", view.render(Instant::now()), HELP);

    loop {
        tokio::select! {
            Some(result) = OptionFuture::from(rates_task.as_mut()), if rates_task.is_some() => {
                rates_task = None;
                match result {
                    Ok(rates) => view.set_rates(rates),
                    Err(e) => error!(error = %e, "Rate fetch task failed"),
                }
            }
            _ = drift.tick() => {
                view.drift();
                println!("{}", view.render_total());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed, leaving dashboard");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let flow = match line.parse::<DashboardCommand>() {
                    Ok(command) => view.handle(command, Instant::now()),
                    Err(e) => Flow::Alert(e.to_string()),
                };
                match flow {
                    Flow::Print(text) => println!("{text}"),
                    Flow::Alert(text) => println!("{}", ui::style_text(&text, ui::StyleType::Error)),
                    Flow::Navigate(screen) => {
                        info!(?screen, "Leaving dashboard");
                        return Ok(Some(screen));
                    }
                    Flow::Quit => break,
                }
            }
        }
    }

    info!("Dashboard closed");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Redistribution;
    use crate::core::rates::ExchangeRateTable;

    fn dashboard(config: &AppConfig) -> Dashboard {
        let mut view = Dashboard::with_rng(config, StdRng::seed_from_u64(1));
        view.set_rates(RateSnapshot {
            fiat: ExchangeRateTable::from([("SGD".to_string(), 1.34)]),
            btc_usd: 60000.0,
        });
        view
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(
            "deposit 100 sgd".parse::<DashboardCommand>().unwrap(),
            DashboardCommand::Deposit {
                amount: "100".to_string(),
                currency: "sgd".to_string()
            }
        );
        assert_eq!(
            "SELECT balanced".parse::<DashboardCommand>().unwrap(),
            DashboardCommand::Select(Bucket::Balanced)
        );
        assert_eq!("quit".parse::<DashboardCommand>().unwrap(), DashboardCommand::Quit);
        assert!("deposit 100".parse::<DashboardCommand>().is_err());
        assert!("select yolo".parse::<DashboardCommand>().is_err());
        assert!("dance".parse::<DashboardCommand>().is_err());
    }

    #[test]
    fn test_modal_flow_deposits_and_notifies() {
        let config = AppConfig::default();
        let mut view = dashboard(&config);
        let now = Instant::now();
        let before = view.engine().total_asset_value();

        view.handle(DashboardCommand::OpenFiat, now);
        view.handle(DashboardCommand::Amount("100".to_string()), now);
        let Flow::Print(modal) = view.handle(DashboardCommand::Currency("SGD".to_string()), now)
        else {
            panic!("expected modal render");
        };
        assert!(modal.contains("Equivalent in USD: 134.0000"));

        let Flow::Print(screen) = view.handle(DashboardCommand::Confirm, now) else {
            panic!("expected redraw");
        };
        assert!(screen.contains("Deposited 100 SGD, equivalent to USD 134.000000"));
        assert!((view.engine().total_asset_value() - (before + 134.0)).abs() < 1e-9);

        // Toast is gone after the configured lifetime
        let later = now + Duration::from_millis(config.schedule.notification_ms + 1);
        assert!(!view.render(later).contains("Deposited 100 SGD"));
    }

    #[test]
    fn test_btc_shortcut() {
        let config = AppConfig::default();
        let mut view = dashboard(&config);
        let flow = view.handle(DashboardCommand::DepositBtc("0.5".to_string()), Instant::now());
        let Flow::Print(screen) = flow else {
            panic!("expected redraw, got {flow:?}");
        };
        assert!(screen.contains("30000.00"));
    }

    #[test]
    fn test_missing_rate_alerts_and_keeps_modal() {
        let config = AppConfig::default();
        let mut view = dashboard(&config);
        let now = Instant::now();
        let flow = view.handle(
            DashboardCommand::Deposit {
                amount: "10".to_string(),
                currency: "EUR".to_string(),
            },
            now,
        );
        assert_eq!(
            flow,
            Flow::Alert("Exchange rate not available for selected currency.".to_string())
        );
        assert!(view.render_modal().contains("Currency: EUR"));

        // Switching to a known currency and confirming succeeds
        view.handle(DashboardCommand::Currency("SGD".to_string()), now);
        assert!(matches!(view.handle(DashboardCommand::Confirm, now), Flow::Print(_)));
        assert!(view.render_modal().contains("No deposit window open."));
    }

    #[test]
    fn test_btc_disabled() {
        let mut config = AppConfig::default();
        config.dashboard.enable_btc_deposit = false;
        let mut view = dashboard(&config);
        assert_eq!(
            view.handle(DashboardCommand::OpenBtc, Instant::now()),
            Flow::Alert("BTC deposits are disabled.".to_string())
        );
    }

    #[test]
    fn test_legacy_redistribution_is_configurable() {
        let mut config = AppConfig::default();
        config.dashboard.redistribution = Redistribution::Legacy;
        let mut view = dashboard(&config);
        let before = view.engine().total_asset_value();
        view.handle(
            DashboardCommand::Deposit {
                amount: "100".to_string(),
                currency: "SGD".to_string(),
            },
            Instant::now(),
        );
        assert!(view.engine().total_asset_value() - before < 134.0);
    }

    #[test]
    fn test_drift_keeps_total_derived_from_latest() {
        let config = AppConfig::default();
        let mut view = dashboard(&config);
        view.drift();
        let latest = view.engine().latest().unwrap().total();
        assert_eq!(view.engine().total_asset_value(), latest);
        assert!(view.render_total().contains(&format!("{latest:.2}")));
    }

    #[test]
    fn test_theme_toggle() {
        let config = AppConfig::default();
        let mut view = dashboard(&config);
        assert_eq!("Theme".parse::<DashboardCommand>().unwrap(), DashboardCommand::Theme);

        let before = ui::theme();
        let Flow::Print(message) = view.handle(DashboardCommand::Theme, Instant::now()) else {
            panic!("expected theme message");
        };
        assert_ne!(ui::theme(), before);
        assert_eq!(message, format!("Switched to {} theme.", ui::theme()));

        view.handle(DashboardCommand::Theme, Instant::now());
        assert_eq!(ui::theme(), before);
    }

    #[test]
    fn test_confirm_without_modal() {
        let config = AppConfig::default();
        let mut view = dashboard(&config);
        assert_eq!(
            view.handle(DashboardCommand::Confirm, Instant::now()),
            Flow::Alert("No deposit window is open.".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_navigates_home() {
        use crate::core::rates::tests::{StaticPrices, StaticRates};
        use std::sync::Arc;

        let client = RateClient::new(
            Arc::new(StaticRates(None)),
            Arc::new(StaticPrices(None)),
        );
        let mut input: &[u8] = b"show\nselect aggressive\nhome\n";
        let next = run(&AppConfig::default(), client, &mut input).await.unwrap();
        assert_eq!(next, Some(Screen::Home));
    }
}
