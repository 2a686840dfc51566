use super::input::{self, Screen, expect_args};
use super::ui;
use crate::core::config::AppConfig;
use crate::core::ledger::{ConsumerLedger, LedgerModal, RequestKind};
use crate::core::schedule::Ticker;
use crate::core::shipment::ShipmentTracker;
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

const HELP: &str =
    "Commands: stop <number> | deposit <amount> | loan <amount> | show | home | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerCommand {
    /// 1-based stop number as shown in the route table.
    Stop(usize),
    Deposit(String),
    Loan(String),
    Show,
    Home,
    Help,
    Quit,
}

impl FromStr for ConsumerCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let (verb, args) = input::split(line).ok_or_else(|| anyhow!("{}", HELP))?;
        let command = match verb.as_str() {
            "stop" => {
                let [number] = expect_args(&args, "stop <number>")?;
                let number = number
                    .parse::<usize>()
                    .map_err(|_| anyhow!("Invalid stop number: {}", number))?;
                ConsumerCommand::Stop(number)
            }
            "deposit" => {
                let [amount] = expect_args(&args, "deposit <amount>")?;
                ConsumerCommand::Deposit(amount.to_string())
            }
            "loan" => {
                let [amount] = expect_args(&args, "loan <amount>")?;
                ConsumerCommand::Loan(amount.to_string())
            }
            "show" => ConsumerCommand::Show,
            "home" => ConsumerCommand::Home,
            "help" => ConsumerCommand::Help,
            "quit" | "exit" => ConsumerCommand::Quit,
            other => return Err(anyhow!("Unknown command: {}. {}", other, HELP)),
        };
        Ok(command)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Print(String),
    Alert(String),
    Navigate(Screen),
    Quit,
}

/// Consumer tracking screen: shipment progress plus the deposit/loan ledger.
pub struct ConsumerView {
    tracker: ShipmentTracker,
    ledger: Option<(ConsumerLedger, LedgerModal)>,
    ship_ticks: usize,
}

impl ConsumerView {
    pub fn new(config: &AppConfig) -> Self {
        ConsumerView {
            tracker: ShipmentTracker::default(),
            ledger: config
                .dashboard
                .enable_loan_ledger
                .then(|| (ConsumerLedger::default(), LedgerModal::default())),
            ship_ticks: 0,
        }
    }

    pub fn tracker(&self) -> &ShipmentTracker {
        &self.tracker
    }

    pub fn ledger(&self) -> Option<&ConsumerLedger> {
        self.ledger.as_ref().map(|(ledger, _)| ledger)
    }

    /// One shipment tick; `false` once the ship has reached its last stop.
    pub fn advance(&mut self) -> bool {
        self.ship_ticks += 1;
        self.tracker.advance()
    }

    /// Shipment ticks received, including the one that found the route done.
    pub fn ship_ticks(&self) -> usize {
        self.ship_ticks
    }

    /// Rounded progress, the position of the ship's progress bar.
    pub fn percent_complete(&self) -> u64 {
        self.tracker.progress_percent().round() as u64
    }

    fn position_label(&self) -> String {
        let position = self.tracker.current_position();
        format!("({:.4}, {:.4})", position.lat, position.lng)
    }

    fn submit(&mut self, kind: RequestKind, amount: &str) -> Flow {
        let Some((ledger, modal)) = self.ledger.as_mut() else {
            return Flow::Alert("Deposits and loans are not available.".to_string());
        };
        modal.open(kind);
        modal.set_amount(amount);
        match modal.confirm(ledger) {
            Some(Ok(message)) => Flow::Print(format!("{}\n{}", message, self.render_ledger())),
            Some(Err(e)) => Flow::Alert(e.to_string()),
            None => Flow::Alert("No request is open.".to_string()),
        }
    }

    pub fn handle(&mut self, command: ConsumerCommand) -> Flow {
        match command {
            ConsumerCommand::Stop(number) => {
                let found = number
                    .checked_sub(1)
                    .and_then(|index| self.tracker.select_stop(index))
                    .is_some();
                if found {
                    Flow::Print(self.render_details())
                } else {
                    Flow::Alert(format!("No stop numbered {number}."))
                }
            }
            ConsumerCommand::Deposit(amount) => self.submit(RequestKind::Deposit, &amount),
            ConsumerCommand::Loan(amount) => self.submit(RequestKind::Loan, &amount),
            ConsumerCommand::Show => Flow::Print(self.render()),
            ConsumerCommand::Home => Flow::Navigate(Screen::Home),
            ConsumerCommand::Help => Flow::Print(HELP.to_string()),
            ConsumerCommand::Quit => Flow::Quit,
        }
    }

    pub fn render_progress(&self) -> String {
        format!(
            "{} {}",
            ui::percent_caption(self.tracker.progress_percent()),
            self.position_label()
        )
    }

    pub fn render_details(&self) -> String {
        let title = ui::style_text("Shipment Details", ui::StyleType::Title);
        match self.tracker.selected_stop() {
            Some(stop) => format!(
                "{}\nPort: {}\nAmount: {}\nLocation: ({:.4}, {:.4})",
                title,
                stop.city,
                ui::format_dollars(stop.amount_usd),
                stop.location.lat,
                stop.location.lng
            ),
            None => format!(
                "{}\n{}",
                title,
                ui::style_text("Click on a port to see details", ui::StyleType::Subtle)
            ),
        }
    }

    fn render_ledger(&self) -> String {
        match self.ledger() {
            Some(ledger) => format!(
                "Deposited: USD {:.2} | Max loan: USD {:.2} | Loan: USD {:.2}",
                ledger.deposited_usd, ledger.max_loan_usd, ledger.loan_usd
            ),
            None => ui::style_text("Deposits and loans are not available.", ui::StyleType::Subtle),
        }
    }

    pub fn render(&self) -> String {
        let ends = self.tracker.ends();
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Port"),
            ui::header_cell("Amount"),
            ui::header_cell("Status"),
        ]);
        for (i, stop) in self.tracker.waypoints().iter().enumerate() {
            let status = if i < self.tracker.current_index() {
                "Reached"
            } else {
                "Pending"
            };
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&stop.city),
                Cell::new(ui::format_dollars(stop.amount_usd)),
                Cell::new(status),
            ]);
        }

        format!(
            "{}\n\n{}\nRoute: {} -> {} ({} legs)\n{}\nTotal shipment value: {}\n\n{}\n\n{}",
            ui::style_text("Consumer Tracking", ui::StyleType::Title),
            self.render_progress(),
            ends.origin.1,
            ends.destination.1,
            self.tracker.route().len().saturating_sub(1),
            table,
            ui::format_dollars(self.tracker.total_amount()),
            self.render_details(),
            self.render_ledger()
        )
    }
}

/// Runs the consumer screen until `quit`, `home` or end of input. The
/// shipment ticker is cancelled once the ship reaches its last stop.
pub async fn run<R>(config: &AppConfig, input: &mut R) -> Result<Option<Screen>>
where
    R: AsyncBufRead + Unpin,
{
    let mut view = ConsumerView::new(config);
    run_view(config, &mut view, input).await
}

/// Drives an existing view; the caller keeps it for inspection afterwards.
pub async fn run_view<R>(
    config: &AppConfig,
    view: &mut ConsumerView,
    input: &mut R,
) -> Result<Option<Screen>>
where
    R: AsyncBufRead + Unpin,
{
    info!("Mounting consumer tracking");
    let mut lines = input.lines();
    let mut ship = Ticker::from_millis(config.schedule.shipment_ms);
    let bar = ui::new_percent_bar(&view.position_label());
    bar.set_position(view.percent_complete());

    bar.suspend(|| println!("{}\n{}", view.render(), HELP));

    loop {
        tokio::select! {
            _ = ship.tick() => {
                if view.advance() {
                    bar.set_message(view.position_label());
                    bar.set_position(view.percent_complete());
                } else {
                    debug!("Shipment complete, stopping ticker");
                    ship.cancel();
                    bar.finish();
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed, leaving consumer screen");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let flow = match line.parse::<ConsumerCommand>() {
                    Ok(command) => view.handle(command),
                    Err(e) => Flow::Alert(e.to_string()),
                };
                match flow {
                    Flow::Print(text) => bar.suspend(|| println!("{text}")),
                    Flow::Alert(text) => bar.suspend(|| {
                        println!("{}", ui::style_text(&text, ui::StyleType::Error))
                    }),
                    Flow::Navigate(screen) => {
                        info!(?screen, "Leaving consumer tracking");
                        bar.finish_and_clear();
                        return Ok(Some(screen));
                    }
                    Flow::Quit => break,
                }
            }
        }
    }

    bar.finish_and_clear();
    info!("Consumer tracking closed");
    Ok(None)
}
