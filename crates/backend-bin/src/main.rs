use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use cosmictv_backend_lib::{build_router, config::Settings, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CosmicTV backend: stream catalog, viewer presence, chat and likes
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if settings.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load_from(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;
    if let Some(port) = args.port {
        settings.port = port;
    }

    init_tracing(&settings);

    if settings.admin_key().is_none() {
        if settings.is_production() {
            tracing::error!("ADMIN_API_KEY is required in production");
            bail!("ADMIN_API_KEY is not set");
        }
        tracing::warn!("ADMIN_API_KEY not set, admin routes are disabled");
    }

    let addr = settings.bind_addr();
    let state = Arc::new(AppState::new(settings));

    let sweeper = state.sweeper().spawn();

    // Drop limiter entries for clients that have gone quiet
    let limiter = state.rate_limiter.clone();
    let window = Duration::from_secs(state.settings.rate_limit.window_secs);
    let limiter_cleanup = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(window);
        loop {
            ticker.tick().await;
            limiter.cleanup();
        }
    });

    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    limiter_cleanup.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
