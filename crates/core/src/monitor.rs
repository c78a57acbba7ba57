//! Invocation entry point.
//!
//! One invocation: resolve config (cached after the first success), run
//! every per-asset check and the Pendle check concurrently, then build a
//! status-coded JSON response. A config or on-chain failure turns the whole
//! invocation into a 500; the Pendle check cannot fail it.

use std::sync::Arc;

use capwatch_api::{MarketSource, Notifier, PendleClient, PendleSettings, TelegramTransport};
use capwatch_chain::{connect_http, OnChainReadError, ReserveDataSource};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};

use crate::config::{vars, AppConfig, ConfigError};
use crate::evaluator::{evaluate, render_message, ReserveSnapshot};
use crate::pendle_check::{check_and_notify, PendleMarketState};
use crate::watchlist::WatchedAsset;

/// Fatal invocation failure.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    OnChainRead(#[from] OnChainReadError),
}

/// Process-lifetime state shared by every invocation.
#[derive(Clone)]
pub struct MonitorContext {
    pub config: AppConfig,
    pub reserves: Arc<dyn ReserveDataSource>,
    pub notifier: Notifier,
    pub markets: Arc<dyn MarketSource>,
    pub pendle: PendleSettings,
}

impl MonitorContext {
    /// Build live clients for `config`. No network call is made.
    pub fn connect(config: AppConfig) -> Result<Self, ConfigError> {
        let reserves = connect_http(&config.rpc_url, config.data_provider, config.reserve_query)
            .map_err(|e| ConfigError::invalid(vars::RPC_URL, e))?;

        let notifier = Notifier::new(
            Arc::new(TelegramTransport::new()),
            config.alert_bot.clone(),
            config.no_alert_bot.clone(),
        );

        Ok(Self {
            config,
            reserves,
            notifier,
            markets: Arc::new(PendleClient::new()),
            pendle: PendleSettings::default(),
        })
    }
}

/// Body of a successful invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum InvocationSummary {
    Assets(Vec<ReserveSnapshot>),
    WithPendle {
        assets: Vec<ReserveSnapshot>,
        pendle: PendleMarketState,
    },
}

impl InvocationSummary {
    pub fn assets(&self) -> &[ReserveSnapshot] {
        match self {
            Self::Assets(assets) | Self::WithPendle { assets, .. } => assets,
        }
    }
}

/// Status code plus JSON body, as consumed by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(summary: &InvocationSummary) -> Self {
        match serde_json::to_string_pretty(summary) {
            Ok(body) => Self {
                status_code: 200,
                body,
            },
            Err(e) => Self::error(&e.to_string()),
        }
    }

    pub fn error(message: &str) -> Self {
        let body = serde_json::json!({ "error": message });
        Self {
            status_code: 500,
            body: serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

type Initializer = Box<dyn Fn() -> Result<MonitorContext, ConfigError> + Send + Sync>;

/// Runs invocations against a lazily built, cached [`MonitorContext`].
pub struct Monitor {
    init: Initializer,
    context: OnceCell<Arc<MonitorContext>>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("initialized", &self.context.initialized())
            .finish()
    }
}

impl Monitor {
    /// Monitor resolving its configuration from the process environment.
    pub fn from_env() -> Self {
        Self::with_initializer(|| {
            let config = AppConfig::from_env()?;
            config.log_config();
            MonitorContext::connect(config)
        })
    }

    /// Monitor with a custom context builder. `init` runs on first use and
    /// again after a failure, never after a success.
    pub fn with_initializer(
        init: impl Fn() -> Result<MonitorContext, ConfigError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            init: Box::new(init),
            context: OnceCell::new(),
        }
    }

    /// Monitor around a ready-made context.
    pub fn with_context(context: MonitorContext) -> Self {
        Self::with_initializer(move || Ok(context.clone()))
    }

    /// Cached context, building it on first use.
    pub async fn context(&self) -> Result<Arc<MonitorContext>, ConfigError> {
        self.context
            .get_or_try_init(|| async { (self.init)().map(Arc::new) })
            .await
            .cloned()
    }

    /// Run one invocation and render the response.
    pub async fn invoke(&self) -> InvocationResponse {
        match self.run().await {
            Ok(summary) => {
                let alerts = summary.assets().iter().filter(|s| s.alert).count();
                info!(
                    assets = summary.assets().len(),
                    alerts = alerts,
                    "Invocation complete"
                );
                InvocationResponse::ok(&summary)
            }
            Err(e) => {
                error!(error = %e, "Invocation failed");
                InvocationResponse::error(&e.to_string())
            }
        }
    }

    /// Run one invocation.
    pub async fn run(&self) -> Result<InvocationSummary, InvocationError> {
        let ctx = self.context().await?;

        let asset_checks = join_all(
            ctx.config
                .watch_list
                .iter()
                .map(|asset| check_asset(&ctx, asset)),
        );

        let pendle_check = async {
            if ctx.config.pendle_check {
                Some(check_and_notify(ctx.markets.as_ref(), &ctx.pendle, &ctx.notifier).await)
            } else {
                None
            }
        };

        let (asset_results, pendle) = tokio::join!(asset_checks, pendle_check);

        // First on-chain failure fails the batch
        let assets = asset_results.into_iter().collect::<Result<Vec<_>, _>>()?;

        Ok(match pendle {
            Some(pendle) => InvocationSummary::WithPendle { assets, pendle },
            None => InvocationSummary::Assets(assets),
        })
    }
}

/// Read, evaluate and notify for one asset.
#[instrument(skip(ctx, asset), fields(asset = %asset.name))]
async fn check_asset(
    ctx: &MonitorContext,
    asset: &WatchedAsset,
) -> Result<ReserveSnapshot, OnChainReadError> {
    let raw = ctx.reserves.read_reserve(&asset.address).await?;
    let threshold = ctx.config.alert_threshold;

    let snapshot = evaluate(&asset.name, &raw, threshold);
    debug!(
        available = %snapshot.available,
        alert = snapshot.alert,
        uncapped = snapshot.uncapped,
        "Asset evaluated"
    );

    let text = render_message(&snapshot, ctx.reserves.query(), threshold);
    ctx.notifier.route(snapshot.alert, &text).await;

    Ok(snapshot)
}
