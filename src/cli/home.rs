use super::input::{self, Screen};
use super::ui;
use crate::core::config::AppConfig;
use crate::core::news::NewsRotation;
use crate::core::rates::{MARKET_ASSETS, MarketQuote, RateClient};
use crate::core::schedule::{ScopedTask, Ticker};
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use futures::future::OptionFuture;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info, warn};

const HELP: &str = "Commands: login | signup | start | next | prev | show | help | quit";

const HERO_TITLE: &str = "Your Gateway to Smarter Trading";
const HERO_TAGLINE: &str = "Trade stocks, crypto, and forex with real-time analytics.";
const LOGIN_MESSAGE: &str = "Login successful! Welcome back.";

const FEATURES: [&str; 4] = [
    "Real-time Insights",
    "Low Trading Fees",
    "Secure Transactions",
    "User-Friendly Interface",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeCommand {
    Login,
    SignUp,
    Start,
    Next,
    Prev,
    Show,
    Help,
    Quit,
}

impl FromStr for HomeCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let (verb, _) = input::split(line).ok_or_else(|| anyhow!("{}", HELP))?;
        match verb.as_str() {
            "login" => Ok(HomeCommand::Login),
            "signup" | "sign-up" => Ok(HomeCommand::SignUp),
            "start" => Ok(HomeCommand::Start),
            "next" => Ok(HomeCommand::Next),
            "prev" | "previous" => Ok(HomeCommand::Prev),
            "show" => Ok(HomeCommand::Show),
            "help" => Ok(HomeCommand::Help),
            "quit" | "exit" => Ok(HomeCommand::Quit),
            other => Err(anyhow!("Unknown command: {}. {}", other, HELP)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Print(String),
    /// Leave for `to`, printing `notice` first when present.
    Navigate {
        to: Screen,
        notice: Option<String>,
    },
    Quit,
}

/// Landing page: market overview, feature list and rotating news.
#[derive(Debug, Default)]
pub struct HomeView {
    quotes: Option<Vec<MarketQuote>>,
    news: NewsRotation,
}

impl HomeView {
    pub fn quotes(&self) -> Option<&[MarketQuote]> {
        self.quotes.as_deref()
    }

    /// Applies a market refresh. A failed refresh keeps what is on screen.
    pub fn set_market(&mut self, result: Result<Vec<MarketQuote>>) {
        match result {
            Ok(quotes) => {
                debug!(count = quotes.len(), "Market data refreshed");
                self.quotes = Some(quotes);
            }
            Err(e) => warn!(error = %e, "Market refresh failed, keeping previous data"),
        }
    }

    pub fn rotate_news(&mut self) {
        self.news.next();
    }

    pub fn handle(&mut self, command: HomeCommand) -> Flow {
        match command {
            HomeCommand::Login => Flow::Navigate {
                to: Screen::Consumer,
                notice: Some(LOGIN_MESSAGE.to_string()),
            },
            HomeCommand::SignUp => Flow::Print(ui::style_text(
                "Sign up is not available yet.",
                ui::StyleType::Subtle,
            )),
            HomeCommand::Start => Flow::Navigate {
                to: Screen::Dashboard,
                notice: None,
            },
            HomeCommand::Next => {
                self.news.next();
                Flow::Print(self.render_news())
            }
            HomeCommand::Prev => {
                self.news.previous();
                Flow::Print(self.render_news())
            }
            HomeCommand::Show => Flow::Print(self.render()),
            HomeCommand::Help => Flow::Print(HELP.to_string()),
            HomeCommand::Quit => Flow::Quit,
        }
    }

    pub fn render_market(&self) -> String {
        let title = ui::style_text("Market Overview", ui::StyleType::Title);
        let Some(quotes) = &self.quotes else {
            return format!(
                "{}\n{}",
                title,
                ui::style_text("Loading market data...", ui::StyleType::Subtle)
            );
        };

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Asset"),
            ui::header_cell("Price"),
            ui::header_cell("24h Change"),
        ]);
        for quote in quotes {
            table.add_row(vec![
                Cell::new(&quote.name),
                Cell::new(ui::format_dollars(quote.price_usd)),
                ui::change_cell(quote.change_24h_pct),
            ]);
        }
        format!("{title}\n{table}")
    }

    pub fn render_news(&self) -> String {
        format!(
            "{} {}",
            ui::style_text("News:", ui::StyleType::TotalLabel),
            self.news.current().unwrap_or_default()
        )
    }

    pub fn render(&self) -> String {
        let features = FEATURES
            .iter()
            .map(|feature| format!("  * {feature}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{}    [login] [signup]\n\n{}\n{} Type `start` to get started.\n\n{}\n\n{}\n{}\n\n{}\n\n{}",
            ui::style_text("TradeX", ui::StyleType::Title),
            ui::style_text(HERO_TITLE, ui::StyleType::TotalLabel),
            HERO_TAGLINE,
            self.render_market(),
            ui::style_text("Why Trade with Us?", ui::StyleType::Title),
            features,
            self.render_news(),
            ui::style_text("\u{a9} 2025 SILK ROSE. All rights reserved.", ui::StyleType::Subtle)
        )
    }
}

fn spawn_market_fetch(client: &Arc<RateClient>) -> ScopedTask<Result<Vec<MarketQuote>>> {
    let client = Arc::clone(client);
    ScopedTask::spawn(async move { client.market().await })
}

/// Runs the home screen until the user navigates away, quits, or input ends.
pub async fn run<R>(config: &AppConfig, client: RateClient, input: &mut R) -> Result<Option<Screen>>
where
    R: AsyncBufRead + Unpin,
{
    info!(assets = ?MARKET_ASSETS, "Mounting home screen");
    let client = Arc::new(client);
    let mut view = HomeView::default();
    let mut lines = input.lines();
    let mut refresh = Ticker::from_millis(config.schedule.market_refresh_ms);
    let mut news = Ticker::from_millis(config.schedule.news_ms);
    let mut fetch = Some(spawn_market_fetch(&client));
    let mut spinner = Some(ui::new_spinner("Loading market data..."));

    println!("{}\n{}", view.render(), HELP);

    loop {
        tokio::select! {
            Some(result) = OptionFuture::from(fetch.as_mut()), if fetch.is_some() => {
                fetch = None;
                match result {
                    Ok(market) => {
                        let first = view.quotes().is_none();
                        view.set_market(market);
                        if first && view.quotes().is_some() {
                            if let Some(pb) = spinner.take() {
                                pb.finish_and_clear();
                            }
                            println!("{}", view.render_market());
                        }
                    }
                    Err(e) => error!(error = %e, "Market fetch task failed"),
                }
            }
            _ = refresh.tick() => {
                if fetch.is_none() {
                    fetch = Some(spawn_market_fetch(&client));
                }
            }
            _ = news.tick() => {
                view.rotate_news();
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed, leaving home screen");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let flow = match line.parse::<HomeCommand>() {
                    Ok(command) => view.handle(command),
                    Err(e) => Flow::Print(ui::style_text(&e.to_string(), ui::StyleType::Error)),
                };
                match flow {
                    Flow::Print(text) => println!("{text}"),
                    Flow::Navigate { to, notice } => {
                        info!(screen = ?to, "Leaving home screen");
                        if let Some(pb) = spinner.take() {
                            pb.finish_and_clear();
                        }
                        if let Some(notice) = notice {
                            println!("{notice}");
                        }
                        return Ok(Some(to));
                    }
                    Flow::Quit => break,
                }
            }
        }
    }

    if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }
    Ok(None)
}
