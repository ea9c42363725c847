//! Application entry point for the `smartfarm-telemetry` service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the farm state store from its standard seed
//! - Spawning the simulator ticker
//! - Mounting all HTTP routes via the `routes` gateway (EMBP pattern)
//! - Serving until Ctrl-C, then shutting the store and ticker down
//!
//! # Environment Variables
//! - `FARM_BIND_ADDR` (optional) – listen address (default: `0.0.0.0:8080`)
//! - `TICK_INTERVAL_MS` (optional) – simulator cadence (default: 3000)
//! - `SIM_SEED` (optional) – reproducible simulator seed
//! - `FARM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `FARM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! Threshold overrides are documented in `config.rs`.
use std::env;

use anyhow::{Context, Result};
use axum::Router;
use chrono::Utc;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use smartfarm_telemetry::{config, routes, Farm, FarmSeed, Simulator, Ticker};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let farm = Farm::new(FarmSeed::standard(Utc::now()).with_thresholds(cfg.thresholds));

    let simulator = match cfg.sim_seed {
        Some(seed) => Simulator::seeded(seed),
        None => Simulator::from_entropy(),
    };
    let ticker = Ticker::spawn(farm.clone(), simulator, cfg.tick_interval);

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(farm.clone());

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind_addr))?;
    tracing::info!("Listening on {}", cfg.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(farm.clone()))
        .await?;

    let ticks = ticker.stop().await;
    tracing::info!("Shutdown complete after {} ticks", ticks);
    Ok(())
}

// ---

/// Resolve on Ctrl-C, shutting the farm down first so open reading streams
/// end and the server can drain.
async fn shutdown_signal(farm: Farm) {
    // ---
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
    tracing::info!("Shutdown requested");
    farm.shutdown();
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `FARM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, falling back to `FARM_LOG_LEVEL`
///
/// Call once at startup, before any tracing macro runs.
fn init_tracing() {
    // ---
    let span_events = match env::var("FARM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to FARM_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("FARM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
