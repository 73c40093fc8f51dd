//! Mesh API Server
//!
//! Serves latitude profiles, mesh geometry and per-triangle aggregates of
//! ICON unstructured-grid datasets.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use mesh_api::config::ServerSettings;
use mesh_api::state::AppState;

/// Mesh API Server
#[derive(Parser, Debug)]
#[command(name = "mesh-api")]
#[command(about = "Spatial aggregation server for ICON unstructured-grid datasets")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:50051", env = "MESH_LISTEN_ADDR")]
    listen: String,

    /// Directory containing the NetCDF datasets
    #[arg(long, default_value = "./data", env = "MESH_DATA_DIR")]
    data_dir: PathBuf,

    /// Root of the per-domain latitude membership files
    #[arg(long, default_value = "./membership", env = "MESH_MEMBERSHIP_DIR")]
    membership_dir: PathBuf,

    /// YAML configuration file
    #[arg(long, env = "MESH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "MESH_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Refuse to start when latitude membership data is missing or invalid
    #[arg(long, env = "MESH_STRICT_LOOKUP")]
    strict_lookup: bool,

    /// Cells per streamed batch
    #[arg(long, env = "MESH_STREAM_BATCH_SIZE")]
    batch_size: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!("Starting mesh API server");

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let settings = ServerSettings {
        data_dir: args.data_dir,
        membership_dir: args.membership_dir,
        config_path: args.config,
        strict_lookup: args.strict_lookup,
        batch_size: args.batch_size,
    };

    // Lookup tables are built here, before the listener binds
    let state = AppState::new(&settings)
        .context("Failed to initialize application state")?
        .with_prometheus(prometheus_handle);
    let app = mesh_api::router(Arc::new(state));

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Mesh API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
