//! Lending-market cap monitor core.
//!
//! Reads supply headroom for a watch list of reserves, evaluates it against
//! an alert threshold and routes a formatted report to one of two Telegram
//! channels. A Pendle market capacity check runs alongside.

pub mod config;
mod evaluator;
pub mod format;
mod monitor;
mod pendle_check;
pub mod u256_math;
mod watchlist;

#[cfg(test)]
mod test_support;

pub use config::{AppConfig, ConfigError};
pub use evaluator::{evaluate, render_message, ReserveSnapshot};
pub use monitor::{
    InvocationError, InvocationResponse, InvocationSummary, Monitor, MonitorContext,
};
pub use pendle_check::{check_and_notify, PendleMarketState};
pub use watchlist::{is_valid_address, WatchListEntry, WatchListError, WatchedAsset};
