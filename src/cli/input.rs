//! Line commands typed at a screen prompt

use anyhow::{Result, anyhow};

/// Screens reachable from one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Dashboard,
    Consumer,
}

/// Splits `deposit 100 SGD` into `("deposit", ["100", "SGD"])`; the verb is
/// lowercased.
pub fn split(line: &str) -> Option<(String, Vec<&str>)> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_lowercase();
    Some((verb, words.collect()))
}

/// Exactly `n` arguments or an error naming the usage.
pub fn expect_args<'a, const N: usize>(args: &[&'a str], usage: &str) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(args).map_err(|_| anyhow!("Usage: {}", usage))
}
