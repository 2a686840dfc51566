//! Domain logic shared by the screens; no terminal I/O here

pub mod config;
pub mod deposit;
pub mod ledger;
pub mod log;
pub mod news;
pub mod portfolio;
pub mod rates;
pub mod schedule;
pub mod shipment;

// Re-export main types for cleaner imports
pub use deposit::{DepositFlow, DepositKind, Notification};
pub use ledger::{ConsumerLedger, LedgerError, LedgerModal, RequestKind};
pub use portfolio::{Bucket, DepositError, PortfolioEngine, PortfolioSnapshot};
pub use rates::{CryptoPriceProvider, FiatRateProvider, MarketQuote, RateClient, RateSnapshot};
pub use shipment::{ShipmentTracker, Waypoint};
