//! PredictChain Market Registry Server
//!
//! REST API for markets, bets and users over the configured repository.

use anyhow::{Context, Result};
use predictchain::api::{create_app, AppState};
use predictchain::{Config, MarketRepository, MemStorage, OnchainStub, SqliteStorage, StorageBackend};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Override with RUST_LOG, e.g. RUST_LOG=debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║       PREDICTCHAIN - MARKET REGISTRY                         ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  Backend: {:<50} ║", config.storage_backend.to_string());
    println!("║  Listen:  {:<50} ║", config.bind_addr);
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    match config.storage_backend {
        StorageBackend::Memory => serve(MemStorage::new(), config).await,
        StorageBackend::Sqlite => {
            let store = SqliteStorage::new(&config.database_path)
                .await
                .with_context(|| format!("Failed to open {}", config.database_path))?;
            serve(store, config).await
        }
        StorageBackend::Onchain => serve(OnchainStub::new(), config).await,
    }
}

async fn serve<S: MarketRepository>(store: S, config: Config) -> Result<()> {
    let addr = config.bind_addr.clone();
    info!("Using {} repository", store.backend());

    let app = create_app(AppState::new(store, config));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);
    println!("  API:    http://{}/api", addr);
    println!("  Health: http://{}/api/health", addr);
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}
