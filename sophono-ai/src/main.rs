//! sophono-ai - HTTP service entry point
//!
//! Serves `POST /process-music`, `POST /process-lyrics` and `GET /health`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sophono_ai::services::ChatCompletionsClient;
use sophono_ai::{build_router, AppState};
use sophono_common::config::{load_config, resolve_api_key};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for sophono-ai
#[derive(Parser, Debug)]
#[command(name = "sophono-ai")]
#[command(about = "Viral-potential analysis service for songs and lyrics")]
#[command(version)]
struct Args {
    /// Config file (overrides SOPHONO_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.bind_addr`
    #[arg(short, long, env = "SOPHONO_BIND_ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("sophono_ai={0},sophono_common={0},tower_http=info", config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    info!(
        "Starting sophono-ai v{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );

    let api_key = resolve_api_key(&config.collaborator);
    let generator = Arc::new(ChatCompletionsClient::from_config(&config.collaborator, api_key));
    info!(
        base_url = %generator.base_url(),
        model = %config.collaborator.model,
        "Collaborator configured"
    );

    let staging_dir = config.staging.resolved_dir();
    std::fs::create_dir_all(&staging_dir)
        .with_context(|| format!("Failed to create staging directory {}", staging_dir.display()))?;
    info!("Staging uploads in {}", staging_dir.display());

    let bind_addr = config.server.bind_addr.clone();
    let app = build_router(AppState::new(config, generator));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
