//! Imagery viewer service.
//!
//! Serves the map view, the discovered layer list with its checkbox panel,
//! and decorated tile URLs for a WMTS endpoint. The capabilities document is
//! fetched once in the background after startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use layer_manager::{CapabilitiesClient, ViewerConfig};
use viewer::{create_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "viewer")]
#[command(about = "WMTS imagery viewer with layer toggles and date filtering")]
struct Args {
    /// YAML viewer config (takes precedence over --preset)
    #[arg(short, long, env = "VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Built-in config: epsg4326, epsg3857, epsg3413 or epsg3031
    #[arg(long, env = "VIEWER_PRESET", default_value = "epsg4326")]
    preset: String,

    /// Base URL for relative capabilities locations
    #[arg(long, env = "VIEWER_BASE_URL")]
    base_url: Option<String>,

    /// Override the capabilities location
    #[arg(long, env = "CAPABILITIES_URL")]
    capabilities_url: Option<String>,

    /// Listen address
    #[arg(short, long, env = "VIEWER_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args)?;
    info!(
        projection = %config.projection,
        endpoint = %config.endpoint_url,
        capabilities = %config.capabilities_url,
        "Starting imagery viewer"
    );

    let client = CapabilitiesClient::from_config(&config)?;
    let state = Arc::new(AppState::new(config).context("Invalid viewer configuration")?);

    let loader = state.clone();
    tokio::spawn(async move {
        loader.load_capabilities(&client).await;
    });

    let app = create_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_config(args: &Args) -> Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ViewerConfig::preset(&args.preset)
            .with_context(|| format!("Unknown preset: {}", args.preset))?,
    };

    if let Some(base_url) = &args.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(url) = &args.capabilities_url {
        config.capabilities_url = url.clone();
    }

    Ok(config)
}
