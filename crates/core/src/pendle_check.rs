//! Pendle market capacity check.
//!
//! One-sided: a message goes out only when remaining capacity is over the
//! threshold. Fetch failures (after retries) produce a diagnostic on the
//! no-alert channel and an error marker, never an invocation failure.

use capwatch_api::{
    fetch_available_capacity, AggregatorError, MarketCapacity, MarketSource, Notifier,
    PendleSettings,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::format::format_magnitude_f64;

/// Outcome of one Pendle check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PendleMarketState {
    Checked {
        #[serde(rename = "availableCapacity")]
        available_capacity: f64,
        alerted: bool,
    },
    Failed {
        error: bool,
        message: String,
    },
}

impl PendleMarketState {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Fetch capacity (with retries) and notify when it exceeds the threshold.
pub async fn check_and_notify(
    source: &dyn MarketSource,
    settings: &PendleSettings,
    notifier: &Notifier,
) -> PendleMarketState {
    match fetch_available_capacity(source, settings).await {
        Ok(capacity) => {
            let alerted = capacity.available_capacity > settings.alert_threshold;
            info!(
                available = capacity.available_capacity,
                threshold = settings.alert_threshold,
                alerted,
                "Pendle capacity checked"
            );
            if alerted {
                let text = render_alert(&capacity, settings);
                notifier.send(notifier.alert_destination(), &text).await;
            }
            PendleMarketState::Checked {
                available_capacity: capacity.available_capacity,
                alerted,
            }
        }
        Err(e) => {
            error!(error = %e, market = %settings.market, "Pendle check failed");
            let text = render_failure(&e, settings);
            notifier.send(notifier.no_alert_destination(), &text).await;
            PendleMarketState::Failed {
                error: true,
                message: e.to_string(),
            }
        }
    }
}

fn render_alert(capacity: &MarketCapacity, settings: &PendleSettings) -> String {
    format!(
        "*Pendle market* `{}`\n\
         • Current supply: *{}*\n\
         • Cap: *{}*\n\
         • Available: *{}*\n\
         ⚠️ *Alert* – more than {} available!",
        settings.market,
        format_magnitude_f64(capacity.current_supply),
        format_magnitude_f64(capacity.supply_cap),
        format_magnitude_f64(capacity.available_capacity),
        format_magnitude_f64(settings.alert_threshold),
    )
}

fn render_failure(err: &AggregatorError, settings: &PendleSettings) -> String {
    format!(
        "❌ *Pendle check failed* after {} attempts\n\
         • Market: `{}`\n\
         • Error: {}\n\
         • At: {}",
        settings.retry.max_attempts,
        settings.market,
        err,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
