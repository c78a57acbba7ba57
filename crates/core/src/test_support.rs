//! In-memory stand-ins for the chain, messaging and aggregator seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use capwatch_api::{
    AggregatorError, BotDestination, ExtendedInfo, MarketRecord, MarketSource, MessageTransport,
    NotificationError, Notifier, PendleSettings, PENDLE_MARKET,
};
use capwatch_chain::{OnChainReadError, RawReserveState, ReserveDataSource, ReserveQuery};
use parking_lot::Mutex;

use crate::config::{base_vars, AppConfig};
use crate::monitor::MonitorContext;
use crate::u256_math::WAD;
use crate::watchlist::WatchedAsset;

pub(crate) fn tokens(n: u64) -> U256 {
    U256::from(n) * WAD
}

/// Records every message as (chat_id, text).
#[derive(Default)]
pub(crate) struct RecordingTransport {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingTransport {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn sent_to(&self, chat_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(chat, _)| chat == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_message(
        &self,
        destination: &BotDestination,
        text: &str,
    ) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .push((destination.chat_id.clone(), text.to_string()));
        if self.fail {
            Err(NotificationError::Transport("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn notifier(transport: Arc<RecordingTransport>) -> Notifier {
    Notifier::new(
        transport,
        BotDestination::new("alert-token", "alert-chat"),
        BotDestination::new("quiet-token", "quiet-chat"),
    )
}

/// Times out the first `failures` calls, then serves the pinned market.
pub(crate) struct FlakyMarkets {
    pub failures: u32,
    pub calls: AtomicU32,
    pub supply: String,
}

impl FlakyMarkets {
    pub(crate) fn with_supply(failures: u32, supply: &str) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            supply: supply.to_string(),
        }
    }
}

#[async_trait]
impl MarketSource for FlakyMarkets {
    async fn fetch_markets(&self) -> Result<Vec<MarketRecord>, AggregatorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(AggregatorError::Timeout);
        }
        Ok(vec![MarketRecord {
            address: PENDLE_MARKET.to_string(),
            extended_info: Some(ExtendedInfo {
                sy_current_supply: Some(serde_json::Value::String(self.supply.clone())),
            }),
        }])
    }
}

/// Serves fixed reserve states by address, after an optional delay.
pub(crate) struct StubReserves {
    pub states: HashMap<String, RawReserveState>,
    pub failing: HashSet<String>,
    pub delay: Duration,
    pub calls: AtomicU32,
}

impl StubReserves {
    pub(crate) fn new() -> Self {
        Self {
            states: HashMap::new(),
            failing: HashSet::new(),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn with_cap(mut self, address: &str, current: U256, supply_cap: u64) -> Self {
        self.states.insert(
            address.to_string(),
            RawReserveState::SupplyCap {
                total_supply: current,
                supply_cap: U256::from(supply_cap),
            },
        );
        self
    }

    pub(crate) fn with_failure(mut self, address: &str) -> Self {
        self.failing.insert(address.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ReserveDataSource for StubReserves {
    fn query(&self) -> ReserveQuery {
        ReserveQuery::DirectSupplyCap
    }

    async fn read_reserve(&self, asset: &str) -> Result<RawReserveState, OnChainReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(asset) {
            return Err(OnChainReadError::Call {
                asset: alloy::primitives::Address::ZERO,
                method: "getReserveCaps",
                reason: "execution reverted".to_string(),
            });
        }
        self.states
            .get(asset)
            .copied()
            .ok_or_else(|| OnChainReadError::InvalidAddress {
                address: asset.to_string(),
                reason: "unknown to stub".to_string(),
            })
    }
}

/// Config with the given watch list and threshold (in whole tokens).
pub(crate) fn config(watch_list: Vec<WatchedAsset>, threshold_tokens: u64) -> AppConfig {
    let mut config = AppConfig::from_source(&base_vars()).expect("base config resolves");
    config.watch_list = watch_list;
    config.alert_threshold = tokens(threshold_tokens);
    config
}

pub(crate) fn context(
    config: AppConfig,
    reserves: Arc<StubReserves>,
    transport: Arc<RecordingTransport>,
    markets: Arc<FlakyMarkets>,
) -> MonitorContext {
    MonitorContext {
        config,
        reserves,
        notifier: notifier(transport),
        markets,
        pendle: PendleSettings::default(),
    }
}
