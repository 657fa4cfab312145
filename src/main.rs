// src/main.rs - ebook store server entry point
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use ebook_store::config::{self, Config};
use ebook_store::store::Store;
use ebook_store::store::order_expiry::spawn_order_sweeper;
use ebook_store::web::api::{AppStateInner, create_router};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ebook-store", version, about = "Ebook store REST API server")]
struct Cli {
    /// Path to a TOML config file. Defaults plus EBOOK_* overrides are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the config file and EBOOK_PORT.
    #[arg(short, long)]
    port: Option<u16>,
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    config.apply_env_overrides()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting ebook store");
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "Loaded configuration");
    }

    let store = Store::new();
    if let Some(admin) = &config.admin {
        ebook_store::bootstrap_admin(&store, admin, config.auth.bcrypt_cost).await?;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppStateInner::new(config, store);

    let background = [
        state
            .token_blacklist
            .spawn_janitor(state.config.auth.blacklist_sweep_interval()),
        state.rate_limiter.spawn_cleanup(),
        spawn_order_sweeper(
            state.store.clone(),
            state.config.orders.sweep_interval(),
            state.config.orders.expiry_policy(),
        ),
    ];

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for task in &background {
        task.cancel();
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
