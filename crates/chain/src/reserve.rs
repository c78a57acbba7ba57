//! Reserve read strategies and headroom math.
//!
//! All amounts are 18-decimal fixed-point integers. Supply caps come back
//! from the data provider in whole tokens and are scaled by [`WAD`] before
//! comparison.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::U256;

/// 1e18, the fixed-point unit for every amount handled here.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// Which data provider view a deployment exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReserveQuery {
    /// `getATokenTotalSupply` + `getReserveCaps`: headroom to the supply cap.
    #[default]
    DirectSupplyCap,
    /// `getReserveData`: liquidity available to borrow (supplied minus debt).
    FullReserveData,
}

impl ReserveQuery {
    /// Label for the "current usage" line of an alert message.
    pub fn current_label(&self) -> &'static str {
        match self {
            Self::DirectSupplyCap => "Total supply",
            Self::FullReserveData => "Total borrowed",
        }
    }

    /// Label for the "limit" line of an alert message.
    pub fn limit_label(&self) -> &'static str {
        match self {
            Self::DirectSupplyCap => "Cap",
            Self::FullReserveData => "Total supplied",
        }
    }
}

impl fmt::Display for ReserveQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectSupplyCap => write!(f, "direct"),
            Self::FullReserveData => write!(f, "full"),
        }
    }
}

/// Error for an unrecognised [`ReserveQuery`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reserve query '{0}' (expected 'direct' or 'full')")]
pub struct UnknownReserveQuery(pub String);

impl FromStr for ReserveQuery {
    type Err = UnknownReserveQuery;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "direct_supply_cap" | "caps" => Ok(Self::DirectSupplyCap),
            "full" | "full_reserve_data" | "reserve_data" => Ok(Self::FullReserveData),
            other => Err(UnknownReserveQuery(other.to_string())),
        }
    }
}

/// Raw on-chain state for one reserve, as returned by the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawReserveState {
    SupplyCap {
        /// aToken total supply (18 decimals)
        total_supply: U256,
        /// Supply cap in whole tokens, 0 = uncapped
        supply_cap: U256,
    },
    ReserveData {
        total_a_token: U256,
        total_stable_debt: U256,
        total_variable_debt: U256,
    },
}

/// Headroom computed from a [`RawReserveState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    /// Current usage (supply or debt)
    pub current: U256,
    /// Scaled cap, or total supplied when measuring borrowable liquidity
    pub limit: U256,
    /// `max(0, limit - current)`; zero when uncapped
    pub available: U256,
    /// Supply cap of zero: no cap configured on-chain
    pub uncapped: bool,
}

impl RawReserveState {
    /// Compute headroom. Never negative; an uncapped reserve reports zero
    /// available and `uncapped = true`.
    pub fn availability(&self) -> Availability {
        match *self {
            Self::SupplyCap {
                total_supply,
                supply_cap,
            } => {
                let limit = supply_cap.saturating_mul(WAD);
                let uncapped = supply_cap.is_zero();
                let available = if uncapped {
                    U256::ZERO
                } else {
                    limit.saturating_sub(total_supply)
                };
                Availability {
                    current: total_supply,
                    limit,
                    available,
                    uncapped,
                }
            }
            Self::ReserveData {
                total_a_token,
                total_stable_debt,
                total_variable_debt,
            } => {
                let debt = total_stable_debt.saturating_add(total_variable_debt);
                Availability {
                    current: debt,
                    limit: total_a_token,
                    available: total_a_token.saturating_sub(debt),
                    uncapped: false,
                }
            }
        }
    }
}
