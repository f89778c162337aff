//! Split Order Engine Binary
//!
//! Starts the engine against the in-memory paper venue and serves the REST
//! command bridge.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin split-order-engine
//! ```
//!
//! # Environment Variables
//!
//! - `SPLIT_ENGINE_CONFIG`: config file path (default: config.yaml)
//! - `RUST_LOG`: log filter (default: `observability.log_level`)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use split_order_engine::SplitOrderEngine;
use split_order_engine::config::{Config, load_config};
use split_order_engine::infrastructure::channel::command_channel;
use split_order_engine::infrastructure::gateway::PaperGateway;
use split_order_engine::infrastructure::http::{AppState, create_router};
use split_order_engine::observability::{MetricsConfig, init_metrics};
use split_order_engine::telemetry::init_tracing;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// How long the engine task gets to finish after cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Queued commands the bridge accepts before callers wait.
const COMMAND_QUEUE_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Searches the working directory and its ancestors.
    let dotenv_path = dotenvy::dotenv().ok();

    let config_path = std::env::var("SPLIT_ENGINE_CONFIG").ok();
    let config = load_config(config_path.as_deref()).context("loading configuration")?;

    init_tracing(&config.observability);
    tracing::info!("Starting Split Order Engine");
    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
    log_config(&config);

    if let Some(port) = config.observability.metrics_port {
        init_metrics(&MetricsConfig::with_port(port))?;
    }

    let gateway = Arc::new(create_gateway(&config));
    let (bridge, channel) =
        command_channel(COMMAND_QUEUE_CAPACITY, config.server.bridge_timeout());

    let engine = SplitOrderEngine::new(
        Arc::clone(&gateway),
        Arc::new(channel),
        Arc::clone(&gateway),
        config.symbol_table(),
        config.engine.placement_settings(),
        config.engine.engine_settings(),
    );

    let shutdown = CancellationToken::new();
    let engine_task = tokio::spawn(engine.run(shutdown.clone()));

    let app = create_router(AppState {
        bridge,
        version: env!("CARGO_PKG_VERSION").to_string(),
    });
    let http_addr: SocketAddr =
        format!("{}:{}", config.server.bind_address, config.server.http_port)
            .parse()
            .context("parsing bind address")?;

    tracing::info!(%http_addr, "Command bridge listening");
    let listener = TcpListener::bind(http_addr).await?;
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await;

    shutdown.cancel();
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, engine_task).await {
        Ok(Ok(registry)) => {
            tracing::info!(groups = registry.len(), "Engine stopped");
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Engine task failed");
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
                "Engine did not stop in time"
            );
        }
    }

    tracing::info!("Split order engine stopped");
    result.context("command bridge server failed")
}

fn log_config(config: &Config) {
    tracing::info!(
        http_port = config.server.http_port,
        magic = config.engine.magic_number,
        comment_prefix = %config.engine.comment_prefix,
        symbols = config.symbols.len(),
        "Configuration loaded"
    );
}

/// Create the paper venue seeded from configuration.
fn create_gateway(config: &Config) -> PaperGateway {
    let gateway = PaperGateway::new(config.symbol_table())
        .with_balance(config.paper.account_balance)
        .with_auto_matching();

    for (symbol, quote) in &config.paper.quotes {
        gateway.set_quote(symbol.as_str(), quote.bid, quote.ask);
    }

    tracing::info!(quotes = config.paper.quotes.len(), "PaperGateway initialized");
    gateway
}

/// Resolves on Ctrl+C, SIGTERM or when `shutdown` is cancelled elsewhere.
#[allow(clippy::expect_used)] // without handlers the process cannot stop cleanly
async fn shutdown_signal(shutdown: CancellationToken) {
    let interrupt = async {
        signal::ctrl_c().await.expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let source = tokio::select! {
        () = interrupt => "ctrl_c",
        () = terminate => "sigterm",
        () = shutdown.cancelled() => "internal",
    };

    shutdown.cancel();
    tracing::info!(
        source,
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Shutting down"
    );
}
