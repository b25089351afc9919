//! concierge-api - Cultural Concierge service
//!
//! Serves cultural profiles, destinations, AI-backed recommendations and
//! analytics over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use concierge_api::services::{FallbackTasteGraph, OpenAiClient, QlooClient};
use concierge_api::AppState;
use concierge_common::config::{ConfigOverrides, RootFolderInitializer, ServiceConfig, TomlConfig};

/// Command-line arguments for concierge-api
#[derive(Parser, Debug)]
#[command(name = "concierge-api")]
#[command(about = "Cultural Concierge API service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind_address: Option<String>,

    /// Data folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Chat model name
    #[arg(long)]
    openai_model: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root_folder: self.root_folder.clone(),
            bind_address: self.bind_address.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
            openai_model: self.openai_model.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Resolve configuration: CLI > environment > TOML > compiled defaults
    let toml_config = TomlConfig::load_or_default(args.config.as_deref());
    let config = ServiceConfig::resolve(&args.overrides(), &toml_config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "concierge_api={level},concierge_common={level},tower_http={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Config problems were collected before the subscriber existed
    for warning in &config.warnings {
        warn!("{}", warning);
    }

    // Log build identification immediately after tracing init
    info!(
        "Starting concierge-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Create data folder and open database
    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let db_pool = concierge_api::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    // AI collaborators; missing keys degrade instead of aborting startup
    let model = OpenAiClient::new(config.openai.clone()).context("Failed to create OpenAI client")?;
    if !model.is_configured() {
        warn!("OPENAI_API_KEY not set: AI endpoints will answer 503");
    }

    let taste = QlooClient::new(config.qloo.clone()).context("Failed to create Qloo client")?;
    if !taste.is_configured() {
        warn!("QLOO_API_KEY not set: taste graph answers come from fallback data");
    }

    let state = AppState::new(
        db_pool,
        Arc::new(model),
        Arc::new(FallbackTasteGraph::new(taste)),
    );
    let app = concierge_api::build_router(state);

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
