//! On-chain reserve reader.
//! Wraps an Alloy provider and the pool data provider contract.

use std::sync::Arc;

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::contracts::IPoolDataProvider;
use crate::reserve::{RawReserveState, ReserveQuery};

/// Failure reading reserve state from the chain.
#[derive(Debug, thiserror::Error)]
pub enum OnChainReadError {
    #[error("invalid asset address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid RPC URL: {reason}")]
    InvalidRpcUrl { reason: String },

    #[error("{method} failed for {asset}: {reason}")]
    Call {
        asset: Address,
        method: &'static str,
        reason: String,
    },
}

impl OnChainReadError {
    fn call(asset: Address, method: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Call {
            asset,
            method,
            reason: err.to_string(),
        }
    }
}

/// Parse a watch-list address for a contract call.
pub fn parse_asset(address: &str) -> Result<Address, OnChainReadError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| OnChainReadError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Source of raw reserve state for a single asset.
#[async_trait]
pub trait ReserveDataSource: Send + Sync {
    /// Strategy this source reads with.
    fn query(&self) -> ReserveQuery;

    /// Read current state for the reserve at `asset` (hex address).
    async fn read_reserve(&self, asset: &str) -> Result<RawReserveState, OnChainReadError>;
}

/// Data provider reader backed by an Alloy provider.
#[derive(Clone)]
pub struct DataProviderReader<P> {
    provider: P,
    data_provider: Address,
    query: ReserveQuery,
}

impl<P> std::fmt::Debug for DataProviderReader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProviderReader")
            .field("data_provider", &self.data_provider)
            .field("query", &self.query)
            .finish()
    }
}

impl<P: Provider> DataProviderReader<P> {
    /// Wrap an existing provider.
    pub fn new(provider: P, data_provider: Address, query: ReserveQuery) -> Self {
        Self {
            provider,
            data_provider,
            query,
        }
    }
}

/// Build an HTTP-backed reader. No network call is made here; the
/// connection is exercised on the first read.
pub fn connect_http(
    rpc_url: &str,
    data_provider: Address,
    query: ReserveQuery,
) -> Result<Arc<dyn ReserveDataSource>, OnChainReadError> {
    let url = reqwest::Url::parse(rpc_url).map_err(|e| OnChainReadError::InvalidRpcUrl {
        reason: e.to_string(),
    })?;
    let provider = ProviderBuilder::new().on_http(url);

    info!(
        data_provider = %data_provider,
        query = %query,
        "Data provider reader initialized"
    );

    Ok(Arc::new(DataProviderReader::new(provider, data_provider, query)))
}

#[async_trait]
impl<P: Provider + 'static> ReserveDataSource for DataProviderReader<P> {
    fn query(&self) -> ReserveQuery {
        self.query
    }

    #[instrument(skip(self), fields(query = %self.query))]
    async fn read_reserve(&self, asset: &str) -> Result<RawReserveState, OnChainReadError> {
        let asset = parse_asset(asset)?;
        let contract = IPoolDataProvider::new(self.data_provider, &self.provider);

        let state = match self.query {
            ReserveQuery::DirectSupplyCap => {
                let supply_call = contract.getATokenTotalSupply(asset);
                let caps_call = contract.getReserveCaps(asset);

                // Both reads in flight together
                let (supply_result, caps_result) =
                    tokio::join!(supply_call.call(), caps_call.call());

                let total_supply = supply_result
                    .map_err(|e| OnChainReadError::call(asset, "getATokenTotalSupply", e))?
                    ._0;
                let caps = caps_result
                    .map_err(|e| OnChainReadError::call(asset, "getReserveCaps", e))?;

                RawReserveState::SupplyCap {
                    total_supply,
                    supply_cap: caps.supplyCap,
                }
            }
            ReserveQuery::FullReserveData => {
                let data = contract
                    .getReserveData(asset)
                    .call()
                    .await
                    .map_err(|e| OnChainReadError::call(asset, "getReserveData", e))?;

                RawReserveState::ReserveData {
                    total_a_token: data.totalAToken,
                    total_stable_debt: data.totalStableDebt,
                    total_variable_debt: data.totalVariableDebt,
                }
            }
        };

        debug!(asset = %asset, state = ?state, "Reserve state fetched");
        Ok(state)
    }
}
