//! Lending-market cap monitor
//!
//! Each tick resolves configuration (once), reads supply headroom for every
//! watched reserve, checks the Pendle market and pushes the reports to
//! Telegram. `RUN_ONCE=true` performs a single invocation and prints the
//! response, for use under an external scheduler.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use capwatch_core::config::{flag_env, ProcessEnv};
use capwatch_core::Monitor;

/// Environment variable names.
mod env {
    pub const CHECK_INTERVAL_SECS: &str = "CHECK_INTERVAL_SECS";
    pub const RUN_ONCE: &str = "RUN_ONCE";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

const DEFAULT_INTERVAL_SECS: u64 = 60;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let monitor = Monitor::from_env();

    if flag_env(&ProcessEnv, env::RUN_ONCE, false)? {
        let response = monitor.invoke().await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        if !response.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let interval = check_interval()?;
    info!(interval_secs = interval.as_secs(), "Starting cap monitor");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let response = monitor.invoke().await;
                debug!(status = response.status_code, body = %response.body, "Invocation response");
                if !response.is_success() {
                    warn!(status = response.status_code, "Check failed, retrying next tick");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let json = std::env::var(env::LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let layer = if json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,capwatch_core=debug,capwatch_chain=debug,capwatch_api=debug")
        }))
        .init();
}

fn check_interval() -> Result<Duration> {
    let secs = match std::env::var(env::CHECK_INTERVAL_SECS) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Invalid {}: {}", env::CHECK_INTERVAL_SECS, raw))?,
        Err(_) => DEFAULT_INTERVAL_SECS,
    };
    anyhow::ensure!(secs > 0, "{} must be positive", env::CHECK_INTERVAL_SECS);
    Ok(Duration::from_secs(secs))
}
