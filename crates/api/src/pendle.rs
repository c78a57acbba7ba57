//! Pendle markets API client and supply headroom lookup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::retry::RetryPolicy;

/// Pendle backend API base URL.
pub const PENDLE_API_BASE: &str = "https://api-v2.pendle.finance/core";

/// Market whose SY supply is tracked.
pub const PENDLE_MARKET: &str = "0x85667e484a32d884010cf16427d90049ccf46e97";

/// Total SY supply cap for the tracked market.
pub const PENDLE_SUPPLY_CAP: f64 = 2_500_000_000.0;

/// Remaining capacity above which an alert is raised.
pub const PENDLE_ALERT_THRESHOLD: f64 = 500_000.0;

/// Per-attempt request timeout.
pub const PENDLE_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Failure fetching or interpreting aggregator data.
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("market {market} not found in aggregator response")]
    MarketNotFound { market: String },

    #[error("invalid aggregator response: {reason}")]
    InvalidResponse { reason: String },

    #[error("aggregator request timed out")]
    Timeout,

    #[error("aggregator returned HTTP {status}")]
    Status { status: u16 },

    #[error("aggregator request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for AggregatorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::InvalidResponse {
                reason: e.to_string(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Settings for the Pendle capacity check.
#[derive(Debug, Clone)]
pub struct PendleSettings {
    /// Market address (compared case-insensitively)
    pub market: String,
    /// Total supply cap, in tokens
    pub supply_cap: f64,
    /// Alert when remaining capacity exceeds this
    pub alert_threshold: f64,
    pub retry: RetryPolicy,
}

impl Default for PendleSettings {
    fn default() -> Self {
        Self {
            market: PENDLE_MARKET.to_string(),
            supply_cap: PENDLE_SUPPLY_CAP,
            alert_threshold: PENDLE_ALERT_THRESHOLD,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MarketsResponse {
    #[serde(default)]
    results: Vec<MarketRecord>,
}

/// One market entry from `/bff/v2/markets/all`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    pub address: String,
    #[serde(default)]
    pub extended_info: Option<ExtendedInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedInfo {
    /// Numeric string in practice; plain numbers are accepted too.
    #[serde(default)]
    pub sy_current_supply: Option<serde_json::Value>,
}

impl MarketRecord {
    /// Parsed `extendedInfo.syCurrentSupply`, if present and finite.
    pub fn sy_current_supply(&self) -> Option<f64> {
        let value = self.extended_info.as_ref()?.sy_current_supply.as_ref()?;
        let supply = match value {
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            serde_json::Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        supply.is_finite().then_some(supply)
    }
}

/// Supply and headroom for the tracked market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketCapacity {
    pub current_supply: f64,
    pub supply_cap: f64,
    /// `supply_cap - current_supply`, not clamped
    pub available_capacity: f64,
}

/// Source of aggregator market records.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_markets(&self) -> Result<Vec<MarketRecord>, AggregatorError>;
}

/// Pendle REST client.
#[derive(Debug, Clone)]
pub struct PendleClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Default for PendleClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PendleClient {
    /// Create a new Pendle client.
    pub fn new() -> Self {
        Self::with_base_url(PENDLE_API_BASE)
    }

    /// Create a client with custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: PENDLE_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl MarketSource for PendleClient {
    #[instrument(skip(self))]
    async fn fetch_markets(&self) -> Result<Vec<MarketRecord>, AggregatorError> {
        let url = format!("{}/bff/v2/markets/all", self.base_url.trim_end_matches('/'));

        // The endpoint sits behind a CDN that rejects non-browser clients
        let response = self
            .client
            .get(&url)
            .query(&[("isActive", "true")])
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, "application/json, text/plain, */*")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(ORIGIN, "https://app.pendle.finance")
            .header(REFERER, "https://app.pendle.finance/")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::Status {
                status: status.as_u16(),
            });
        }

        let data: MarketsResponse = response.json().await?;
        debug!(markets = data.results.len(), "Fetched Pendle markets");
        Ok(data.results)
    }
}

/// Locate the configured market and compute its remaining capacity.
pub fn capacity_from(
    markets: &[MarketRecord],
    settings: &PendleSettings,
) -> Result<MarketCapacity, AggregatorError> {
    let market = markets
        .iter()
        .find(|m| m.address.eq_ignore_ascii_case(&settings.market))
        .ok_or_else(|| AggregatorError::MarketNotFound {
            market: settings.market.clone(),
        })?;

    let current_supply =
        market
            .sy_current_supply()
            .ok_or_else(|| AggregatorError::InvalidResponse {
                reason: "extendedInfo.syCurrentSupply missing or not a finite number"
                    .to_string(),
            })?;

    Ok(MarketCapacity {
        current_supply,
        supply_cap: settings.supply_cap,
        available_capacity: settings.supply_cap - current_supply,
    })
}

/// Fetch the market list and compute remaining capacity, retrying any
/// failure per `settings.retry`. The last error is returned once the
/// attempts are spent.
pub async fn fetch_available_capacity(
    source: &dyn MarketSource,
    settings: &PendleSettings,
) -> Result<MarketCapacity, AggregatorError> {
    settings
        .retry
        .run("pendle_markets", |_attempt| async move {
            let markets = source.fetch_markets().await?;
            capacity_from(&markets, settings)
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(address: &str, supply: serde_json::Value) -> MarketRecord {
        MarketRecord {
            address: address.to_string(),
            extended_info: Some(ExtendedInfo {
                sy_current_supply: Some(supply),
            }),
        }
    }

    /// Fails the first `failures` calls with a timeout, then returns `records`.
    struct FlakySource {
        pub failures: u32,
        pub calls: AtomicU32,
        pub records: Vec<MarketRecord>,
    }

    impl FlakySource {
        fn new(failures: u32, records: Vec<MarketRecord>) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                records,
            }
        }
    }

    #[async_trait]
    impl MarketSource for FlakySource {
        async fn fetch_markets(&self) -> Result<Vec<MarketRecord>, AggregatorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(AggregatorError::Timeout)
            } else {
                Ok(self.records.clone())
            }
        }
    }

    #[test]
    fn test_deserialize_markets_response() {
        let json = r#"{
            "total": 2,
            "results": [
                {
                    "name": "sUSDe",
                    "address": "0x85667E484A32D884010CF16427D90049CCF46E97",
                    "extendedInfo": { "syCurrentSupply": "2000000000", "feeRate": 0.001 }
                },
                { "name": "other", "address": "0x0000000000000000000000000000000000000001" }
            ]
        }"#;

        let data: MarketsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(data.results.len(), 2);
        assert_eq!(data.results[0].sy_current_supply(), Some(2_000_000_000.0));
        assert_eq!(data.results[1].sy_current_supply(), None);
    }

    #[test]
    fn test_capacity_case_insensitive_match() {
        let settings = PendleSettings::default();
        let markets = vec![record(
            &PENDLE_MARKET.to_uppercase().replace("0X", "0x"),
            serde_json::json!("2000000000"),
        )];

        let capacity = capacity_from(&markets, &settings).unwrap();
        assert_eq!(capacity.current_supply, 2_000_000_000.0);
        assert_eq!(capacity.available_capacity, 500_000_000.0);
    }

    #[test]
    fn test_capacity_accepts_json_number() {
        let settings = PendleSettings::default();
        let markets = vec![record(PENDLE_MARKET, serde_json::json!(2_400_000_000u64))];
        let capacity = capacity_from(&markets, &settings).unwrap();
        assert_eq!(capacity.available_capacity, 100_000_000.0);
    }

    #[test]
    fn test_capacity_market_not_found() {
        let settings = PendleSettings::default();
        let markets = vec![record(
            "0x0000000000000000000000000000000000000001",
            serde_json::json!("1"),
        )];
        assert!(matches!(
            capacity_from(&markets, &settings),
            Err(AggregatorError::MarketNotFound { .. })
        ));
    }

    #[test]
    fn test_capacity_invalid_supply() {
        let settings = PendleSettings::default();
        for bad in [
            serde_json::json!("not a number"),
            serde_json::json!("inf"),
            serde_json::json!(null),
            serde_json::json!({ "value": 1 }),
        ] {
            let markets = vec![record(PENDLE_MARKET, bad)];
            assert!(matches!(
                capacity_from(&markets, &settings),
                Err(AggregatorError::InvalidResponse { .. })
            ));
        }

        let missing = vec![MarketRecord {
            address: PENDLE_MARKET.to_string(),
            extended_info: None,
        }];
        assert!(matches!(
            capacity_from(&missing, &settings),
            Err(AggregatorError::InvalidResponse { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_then_succeeds() {
        let source = FlakySource::new(
            2,
            vec![record(PENDLE_MARKET, serde_json::json!("2000000000"))],
        );
        let start = tokio::time::Instant::now();

        let capacity = fetch_available_capacity(&source, &PendleSettings::default())
            .await
            .unwrap();

        assert_eq!(capacity.available_capacity, 500_000_000.0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(600) && elapsed < Duration::from_millis(650));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_market_not_found() {
        let source = FlakySource::new(0, Vec::new());

        let err = fetch_available_capacity(&source, &PendleSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::MarketNotFound { .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_requests_active_markets_with_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bff/v2/markets/all"))
            .and(query_param("isActive", "true"))
            .and(header("origin", "https://app.pendle.finance"))
            .and(header("referer", "https://app.pendle.finance/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {
                        "address": PENDLE_MARKET,
                        "extendedInfo": { "syCurrentSupply": "2000000000" }
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PendleClient::with_base_url(server.uri());
        let markets = client.fetch_markets().await.unwrap();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].sy_current_supply(), Some(2_000_000_000.0));

        let requests = server.received_requests().await.unwrap();
        let user_agent = requests[0]
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok());
        assert_eq!(user_agent, Some(BROWSER_USER_AGENT));
    }

    #[tokio::test]
    async fn test_client_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bff/v2/markets/all"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = PendleClient::with_base_url(server.uri());
        let err = client.fetch_markets().await.unwrap_err();
        assert!(matches!(err, AggregatorError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_client_maps_slow_reply_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bff/v2/markets/all"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "results": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            PendleClient::with_base_url(server.uri()).with_timeout(Duration::from_millis(50));
        let err = client.fetch_markets().await.unwrap_err();
        assert!(matches!(err, AggregatorError::Timeout));
    }

    #[tokio::test]
    async fn test_client_maps_malformed_body_to_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bff/v2/markets/all"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>challenge</html>"))
            .mount(&server)
            .await;

        let client = PendleClient::with_base_url(server.uri());
        let err = client.fetch_markets().await.unwrap_err();
        assert!(matches!(err, AggregatorError::InvalidResponse { .. }));
    }
}
