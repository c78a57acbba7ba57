//! Capwatch chain interaction layer.
//!
//! This crate provides:
//! - `sol!` bindings for the pool data provider
//! - Reserve read strategies (supply cap vs. full reserve data)
//! - Headroom computation on 18-decimal fixed-point amounts
//! - An Alloy-backed reader behind the `ReserveDataSource` seam

mod contracts;
mod reader;
mod reserve;

pub use contracts::IPoolDataProvider;
pub use reader::{
    connect_http, parse_asset, DataProviderReader, OnChainReadError, ReserveDataSource,
};
pub use reserve::{Availability, RawReserveState, ReserveQuery, UnknownReserveQuery, WAD};
