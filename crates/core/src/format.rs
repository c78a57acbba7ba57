//! Human-readable magnitudes and percentages for alert messages.

use alloy::primitives::U256;

use crate::u256_math::{fixed_to_f64, TOKEN_DECIMALS};

/// Rendered for a percentage of zero.
pub const NO_PERCENT: &str = "—";

/// Rendered in place of a zero (unset) cap.
pub const INFINITE: &str = "∞";

/// Format an 18-decimal amount as "1.23 M", "23.5 K" or "950".
pub fn format_magnitude(amount: U256) -> String {
    format_magnitude_with_decimals(amount, TOKEN_DECIMALS)
}

/// [`format_magnitude`] for amounts with `decimals` decimals.
pub fn format_magnitude_with_decimals(amount: U256, decimals: u8) -> String {
    format_magnitude_f64(fixed_to_f64(amount, decimals))
}

/// Bucket a plain token count:
/// - `>= 1e6`: millions, 2 places below 1e7, else 0
/// - `>= 1e3`: thousands, 1 place below 1e5, else 0
/// - otherwise the integer value
pub fn format_magnitude_f64(num: f64) -> String {
    if num >= 1_000_000.0 {
        let places = if num >= 10_000_000.0 { 0 } else { 2 };
        format!("{} M", fixed(num / 1_000_000.0, places))
    } else if num >= 1_000.0 {
        let places = if num >= 100_000.0 { 0 } else { 1 };
        format!("{} K", fixed(num / 1_000.0, places))
    } else {
        fixed(num, 0)
    }
}

/// `part / total` with one decimal place, e.g. "10.0 %". Returns "—" when
/// `total` is zero.
///
/// Computed as `part * 1000 / total` in integer arithmetic (truncating),
/// then rendered in tenths, so the output does not depend on float rounding.
pub fn format_percent(part: U256, total: U256) -> String {
    if total.is_zero() {
        return NO_PERCENT.to_string();
    }
    let permille = part.saturating_mul(U256::from(1000u64)) / total;
    let ten = U256::from(10u64);
    format!("{}.{} %", permille / ten, permille % ten)
}

// Ties round half away from zero, like JS toFixed. `format!` alone rounds
// half to even.
fn fixed(value: f64, places: i32) -> String {
    let scale = 10f64.powi(places);
    format!("{:.*}", places as usize, (value * scale).round() / scale)
}
