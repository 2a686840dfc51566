use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tradex::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for tradex::AppCommand {
    fn from(cmd: Commands) -> tradex::AppCommand {
        match cmd {
            Commands::Home => tradex::AppCommand::Home,
            Commands::Dashboard => tradex::AppCommand::Dashboard,
            Commands::Consumer => tradex::AppCommand::Consumer,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Open the landing page with the market overview
    Home,
    /// Open the trading dashboard
    Dashboard,
    /// Open consumer shipment tracking
    Consumer,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => tradex::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = tradex::core::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
providers:
  freecurrency:
    base_url: "https://api.freecurrencyapi.com"
    # api_key: "your-key"  (or set TRADEX_FIAT_API_KEY)
  coingecko:
    base_url: "https://api.coingecko.com"

dashboard:
  conversion: direct
  redistribution: proportional
  enable_btc_deposit: true
  enable_loan_ledger: true
  default_currency: "SGD"

schedule:
  drift_ms: 3000
  shipment_ms: 3000
  news_ms: 5000
  market_refresh_ms: 10000
  notification_ms: 5000
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    println!("Created default configuration at {}", path.display());
    Ok(())
}
