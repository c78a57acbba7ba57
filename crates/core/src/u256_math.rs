//! Fixed-point helpers for 18-decimal token amounts.
//!
//! Conversions to `f64` are for display only; threshold comparisons and
//! percentages stay in `U256`.

use alloy::primitives::utils::{parse_units, ParseUnits};
use alloy::primitives::U256;
use serde::Serializer;

pub use capwatch_chain::WAD;

/// Decimals of every amount handled by the monitor
pub const TOKEN_DECIMALS: u8 = 18;

/// Pre-computed powers of 10 for fast decimal conversion
const POW10: [u128; 39] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
    100_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000_000_000,
];

/// Fast power of 10 lookup (up to 10^38)
#[inline(always)]
pub fn pow10(exp: u8) -> U256 {
    if exp < 39 {
        U256::from(POW10[exp as usize])
    } else {
        U256::from(10u64).pow(U256::from(exp))
    }
}

/// Convert an integer U256 to f64 (nearest, via limbs).
#[inline(always)]
pub fn u256_to_f64(value: U256) -> f64 {
    if value <= U256::from(u128::MAX) {
        return value.to::<u128>() as f64;
    }
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}

/// Convert a fixed-point amount with `decimals` decimals to f64.
///
/// Whole and fractional parts are converted separately so exact token
/// amounts (1e6 tokens, 1e7 tokens, ...) land exactly on their f64 value.
/// Use for display only.
pub fn fixed_to_f64(amount: U256, decimals: u8) -> f64 {
    let scale = pow10(decimals);
    let whole = amount / scale;
    let frac = amount % scale;
    u256_to_f64(whole) + u256_to_f64(frac) / u256_to_f64(scale)
}

/// Convert WAD (18 decimals) to f64.
#[inline(always)]
pub fn wad_to_f64(wad: U256) -> f64 {
    fixed_to_f64(wad, TOKEN_DECIMALS)
}

/// Parse a non-negative decimal string ("50000", "1.5") into an
/// 18-decimal fixed-point amount.
pub fn parse_wad(value: &str) -> Result<U256, String> {
    match parse_units(value.trim(), TOKEN_DECIMALS) {
        Ok(ParseUnits::U256(amount)) => Ok(amount),
        Ok(ParseUnits::I256(_)) => Err("must not be negative".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Serialize a U256 as a base-10 string.
pub fn serialize_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
