//! Threshold evaluation and alert message rendering.

use alloy::primitives::U256;
use capwatch_chain::{RawReserveState, ReserveQuery};
use serde::Serialize;

use crate::format::{format_magnitude, format_percent, INFINITE};
use crate::u256_math::serialize_decimal;

/// Per-asset result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReserveSnapshot {
    pub name: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub current: U256,
    /// Scaled supply cap, or total supplied for borrowable liquidity
    #[serde(rename = "supplyCap", serialize_with = "serialize_decimal")]
    pub cap: U256,
    #[serde(serialize_with = "serialize_decimal")]
    pub available: U256,
    pub alert: bool,
    #[serde(skip)]
    pub uncapped: bool,
}

/// Compute headroom for `name` and decide whether it alerts.
///
/// `alert` is `available >= threshold`. An uncapped reserve reports zero
/// available and never alerts.
pub fn evaluate(name: &str, raw: &RawReserveState, threshold: U256) -> ReserveSnapshot {
    let availability = raw.availability();
    let alert = !availability.uncapped && availability.available >= threshold;

    ReserveSnapshot {
        name: name.to_string(),
        current: availability.current,
        cap: availability.limit,
        available: availability.available,
        alert,
        uncapped: availability.uncapped,
    }
}

/// Markdown message for one snapshot.
pub fn render_message(snapshot: &ReserveSnapshot, query: ReserveQuery, threshold: U256) -> String {
    let mut msg = format!("*{}*\n", snapshot.name);

    msg.push_str(&format!(
        "• {}: *{}*\n",
        query.current_label(),
        format_magnitude(snapshot.current)
    ));

    if snapshot.uncapped {
        msg.push_str(&format!("• {}: {}\n", query.limit_label(), INFINITE));
    } else {
        msg.push_str(&format!(
            "• {}: *{}*\n",
            query.limit_label(),
            format_magnitude(snapshot.cap)
        ));
    }

    msg.push_str(&format!(
        "• Available: *{}* ({} free)\n",
        format_magnitude(snapshot.available),
        format_percent(snapshot.available, snapshot.cap)
    ));

    let threshold = format_magnitude(threshold);
    if snapshot.alert {
        msg.push_str(&format!("⚠️ *Alert* – ≥ {threshold} tokens available!"));
    } else {
        msg.push_str(&format!("✅ No alert – less than {threshold} available."));
    }

    msg
}
