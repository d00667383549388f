//! Fanout entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags and environment via `clap`, plus an
//!    optional TOML file (see [`config`]), validated before anything starts.
//! 2. **Wire observability**: `tracing-subscriber` with a text or JSON layer,
//!    and an OpenTelemetry OTLP exporter when `OTEL_EXPORTER_OTLP_ENDPOINT`
//!    is set.
//! 3. **Construct infrastructure**: the GitHub lookup client and the HTTP
//!    forwarder, injected into the routing [`Dispatcher`] and the gateway.
//! 4. **Serve** the gateway router until SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gateway::{build_router, AppState, HttpForwarder};
use github::GitHubClient;
use routing::Dispatcher;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod config;
mod telemetry;

use config::{FileConfig, Overrides};
use telemetry::LogFormat;

/// fanout - routes monorepo GitHub webhooks to per-package endpoints
#[derive(Parser, Debug)]
#[command(name = "fanout")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "FANOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "FANOUT_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// GitHub token used for changed-file lookups
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Webhook secret; when set, unsigned or badly signed deliveries are rejected
    #[arg(long, env = "FANOUT_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// Monorepo endpoint, overriding `[endpoints] monorepo`
    #[arg(long, env = "FANOUT_MONOREPO_WEBHOOK", hide_env_values = true)]
    monorepo_webhook: Option<String>,

    /// Console log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let telemetry = telemetry::init(args.log_format)?;

    let result = run(args).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "Fanout stopped with an error");
    }

    telemetry.shutdown();
    result
}

async fn run(args: Args) -> Result<()> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = file
        .into_settings(Overrides {
            github_token: args.github_token,
            monorepo_endpoint: args.monorepo_webhook,
        })
        .context("invalid configuration")?;

    info!(
        packages = settings.registry.len(),
        package_endpoints = settings.endpoints.configured_packages().count(),
        suppressed_authors = settings.suppression.len(),
        authenticated = settings.github.token.is_some(),
        "Configuration loaded"
    );
    if settings.endpoints.monorepo().is_none() {
        warn!("No monorepo endpoint configured; events without a package endpoint will be rejected");
    }

    let lookup = GitHubClient::new(settings.github).context("failed to build GitHub client")?;
    let forwarder =
        HttpForwarder::new(settings.forward_timeout).context("failed to build forwarder")?;
    let dispatcher = Dispatcher::new(settings.registry, settings.suppression, Arc::new(lookup));

    let webhook_secret = args
        .webhook_secret
        .filter(|s| !s.is_empty())
        .map(String::into_bytes);
    if webhook_secret.is_none() {
        warn!("No webhook secret configured; signatures will not be verified");
    }

    let app = build_router(AppState::new(
        dispatcher,
        settings.endpoints,
        Arc::new(forwarder),
        webhook_secret,
    ));

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shut down cleanly");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
