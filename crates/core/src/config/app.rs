//! Resolved monitor configuration.

use alloy::primitives::{Address, U256};
use capwatch_api::BotDestination;
use capwatch_chain::ReserveQuery;
use tracing::{info, warn};

use super::env::{
    flag_env, optional_env, require_env, require_json_env, ConfigError, ProcessEnv, VarSource,
};
use crate::format::format_magnitude;
use crate::u256_math::parse_wad;
use crate::watchlist::{WatchListEntry, WatchedAsset};

/// Environment variable names.
pub mod vars {
    pub const RPC_URL: &str = "RPC_URL";
    pub const DATA_PROVIDER_ADDRESS: &str = "DATA_PROVIDER_ADDRESS";
    pub const ALERT_BOT_TOKEN: &str = "ALERT_BOT_TOKEN";
    pub const ALERT_BOT_CHAT_ID: &str = "ALERT_BOT_CHAT_ID";
    pub const NO_ALERT_BOT_TOKEN: &str = "NO_ALERT_BOT_TOKEN";
    pub const NO_ALERT_BOT_CHAT_ID: &str = "NO_ALERT_BOT_CHAT_ID";
    pub const WATCH_LIST: &str = "WATCH_LIST";
    pub const ALERT_THRESHOLD_TOKENS: &str = "ALERT_THRESHOLD_TOKENS";
    pub const RESERVE_QUERY: &str = "RESERVE_QUERY";
    pub const PENDLE_CHECK_ENABLED: &str = "PENDLE_CHECK_ENABLED";
}

/// Everything one invocation needs, resolved up front.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rpc_url: String,
    pub data_provider: Address,
    pub alert_bot: BotDestination,
    pub no_alert_bot: BotDestination,
    /// Ordered, immutable for the process lifetime
    pub watch_list: Vec<WatchedAsset>,
    /// Alert when available >= this (18 decimals)
    pub alert_threshold: U256,
    pub reserve_query: ReserveQuery,
    pub pendle_check: bool,
}

impl AppConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    /// Resolve from `source`. Fails on the first missing or malformed value.
    pub fn from_source(source: &impl VarSource) -> Result<Self, ConfigError> {
        let rpc_url = require_env(source, vars::RPC_URL)?;
        if let Err(e) = check_rpc_url(&rpc_url) {
            return Err(ConfigError::invalid(vars::RPC_URL, e));
        }

        let data_provider = require_env(source, vars::DATA_PROVIDER_ADDRESS)?
            .parse::<Address>()
            .map_err(|e| ConfigError::invalid(vars::DATA_PROVIDER_ADDRESS, e))?;

        let alert_bot = BotDestination::new(
            require_env(source, vars::ALERT_BOT_TOKEN)?,
            require_env(source, vars::ALERT_BOT_CHAT_ID)?,
        );
        let no_alert_bot = BotDestination::new(
            require_env(source, vars::NO_ALERT_BOT_TOKEN)?,
            require_env(source, vars::NO_ALERT_BOT_CHAT_ID)?,
        );

        let watch_list = require_json_env::<Vec<WatchListEntry>>(source, vars::WATCH_LIST)?
            .into_iter()
            .map(WatchedAsset::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::invalid(vars::WATCH_LIST, e))?;

        for asset in watch_list.iter().filter(|a| !a.has_valid_address()) {
            warn!(
                asset = %asset.name,
                address = %asset.address,
                "Watch list address is not 0x + 40 hex digits"
            );
        }

        let alert_threshold = parse_wad(&require_env(source, vars::ALERT_THRESHOLD_TOKENS)?)
            .map_err(|e| ConfigError::invalid(vars::ALERT_THRESHOLD_TOKENS, e))?;

        let reserve_query = match optional_env(source, vars::RESERVE_QUERY) {
            Some(v) => v
                .parse::<ReserveQuery>()
                .map_err(|e| ConfigError::invalid(vars::RESERVE_QUERY, e))?,
            None => ReserveQuery::default(),
        };

        let pendle_check = flag_env(source, vars::PENDLE_CHECK_ENABLED, true)?;

        Ok(Self {
            rpc_url,
            data_provider,
            alert_bot,
            no_alert_bot,
            watch_list,
            alert_threshold,
            reserve_query,
            pendle_check,
        })
    }

    /// Log the resolved configuration (no secrets).
    pub fn log_config(&self) {
        info!(
            data_provider = %self.data_provider,
            assets = self.watch_list.len(),
            threshold = %format_magnitude(self.alert_threshold),
            query = %self.reserve_query,
            pendle_check = self.pendle_check,
            "Configuration resolved"
        );
    }
}

fn check_rpc_url(url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}
