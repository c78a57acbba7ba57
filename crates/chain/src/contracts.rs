//! Pool data provider interface.
//!
//! Two deployments are supported: the supply/cap pair
//! (`getATokenTotalSupply` + `getReserveCaps`) and the flat
//! `getReserveData` view returning supplied and debt totals.

use alloy::sol;

sol! {
    /// Aave V3 style protocol data provider (read-only subset).
    #[sol(rpc)]
    #[derive(Debug)]
    interface IPoolDataProvider {
        /// Total supply of the reserve's aToken, in token base units.
        function getATokenTotalSupply(address asset) external view returns (uint256);

        /// Borrow and supply caps, in whole tokens (0 = uncapped).
        function getReserveCaps(address asset)
            external
            view
            returns (uint256 borrowCap, uint256 supplyCap);

        /// Reserve totals and rates.
        function getReserveData(address asset) external view returns (
            uint256 unbacked,
            uint256 accruedToTreasuryScaled,
            uint256 totalAToken,
            uint256 totalStableDebt,
            uint256 totalVariableDebt,
            uint256 liquidityRate,
            uint256 variableBorrowRate,
            uint256 stableBorrowRate,
            uint256 averageStableBorrowRate,
            uint256 liquidityIndex,
            uint256 variableBorrowIndex,
            uint40 lastUpdateTimestamp
        );
    }
}
