pub mod coingecko;
pub mod freecurrency;
