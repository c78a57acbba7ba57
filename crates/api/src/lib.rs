//! Capwatch API clients for external services.
//!
//! This crate provides HTTP clients for:
//! - Telegram: alert / no-alert message delivery
//! - Pendle: market supply lookup with retry and backoff

mod notifier;
mod pendle;
mod retry;
mod telegram;

pub use notifier::Notifier;
pub use pendle::{
    capacity_from, fetch_available_capacity, AggregatorError, ExtendedInfo, MarketCapacity,
    MarketRecord, MarketSource, PendleClient, PendleSettings, PENDLE_ALERT_THRESHOLD,
    PENDLE_API_BASE, PENDLE_MARKET, PENDLE_REQUEST_TIMEOUT, PENDLE_SUPPLY_CAP,
};
pub use retry::RetryPolicy;
pub use telegram::{
    BotDestination, MessageTransport, NotificationError, TelegramTransport, TELEGRAM_API_BASE,
};
