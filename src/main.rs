//! Stowage server — multi-tenant file-storage backend.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use stowage_api::AppState;
use stowage_core::config::AppConfig;
use stowage_core::error::AppError;
use stowage_database::connection::DatabasePool;
use stowage_database::repositories::{FileRepository, FolderRepository, ShareRepository};
use stowage_service::{FileService, FolderService, ShareAccessService, ShareService};
use stowage_storage::S3ObjectStore;

#[tokio::main]
async fn main() {
    let env = std::env::var("STOWAGE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => fmt().with_env_filter(filter).json().init(),
        _ => fmt().with_env_filter(filter).init(),
    }
}

/// Connect infrastructure, wire services, and serve.
async fn run(config: AppConfig) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    stowage_database::migration::run_migrations(db.pool()).await?;

    let objects = Arc::new(S3ObjectStore::new(&config.object_store)?);
    let container = config.object_store.bucket.clone();

    let folders = Arc::new(FolderRepository::new(db.pool().clone()));
    let files = Arc::new(FileRepository::new(db.pool().clone()));
    let shares = Arc::new(ShareRepository::new(db.pool().clone()));

    let state = AppState {
        folder_service: Arc::new(FolderService::new(
            folders.clone(),
            objects.clone(),
            container.clone(),
        )),
        file_service: Arc::new(FileService::new(
            files.clone(),
            folders.clone(),
            objects.clone(),
            container,
        )),
        share_service: Arc::new(ShareService::new(
            shares.clone(),
            files.clone(),
            folders.clone(),
            config.server.public_base_url.clone(),
        )),
        share_access: Arc::new(ShareAccessService::new(shares, files, folders, objects)),
    };

    let app = stowage_api::build_router(state);
    let address = config.server.bind_address();

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {address}: {e}")))?;

    tracing::info!(%address, "Stowage server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}
