pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::Screen;
use crate::core::config::AppConfig;
use crate::core::rates::RateClient;
use crate::providers::coingecko::CoinGeckoProvider;
use crate::providers::freecurrency::FreeCurrencyProvider;
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, info, warn};

/// Screen to open first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Home,
    Dashboard,
    Consumer,
}

impl From<AppCommand> for Screen {
    fn from(cmd: AppCommand) -> Screen {
        match cmd {
            AppCommand::Home => Screen::Home,
            AppCommand::Dashboard => Screen::Dashboard,
            AppCommand::Consumer => Screen::Consumer,
        }
    }
}

/// Rate client backed by the HTTP providers named in `config`.
pub fn build_rate_client(config: &AppConfig) -> RateClient {
    let api_key = config.fiat_api_key();
    if api_key.is_none() {
        warn!("No fiat API key configured, exchange rate requests may be rejected");
    }
    let fiat = FreeCurrencyProvider::new(&config.providers.freecurrency.base_url, api_key);
    let crypto = CoinGeckoProvider::new(&config.providers.coingecko.base_url);
    RateClient::new(Arc::new(fiat), Arc::new(crypto))
}

/// Runs screens starting at `first`, following navigation until one of them
/// quits or input ends.
pub async fn run_screens<R>(config: &AppConfig, first: Screen, input: &mut R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut next = Some(first);
    while let Some(screen) = next {
        debug!(?screen, "Opening screen");
        if screen != first {
            cli::ui::print_separator();
        }
        next = match screen {
            Screen::Home => cli::home::run(config, build_rate_client(config), input).await?,
            Screen::Dashboard => {
                cli::dashboard::run(config, build_rate_client(config), input).await?
            }
            Screen::Consumer => cli::consumer::run(config, input).await?,
        };
    }
    Ok(())
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("TradeX starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let mut stdin = BufReader::new(tokio::io::stdin());
    run_screens(&config, command.into(), &mut stdin).await
}
