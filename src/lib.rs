pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

use std::sync::Arc;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use logic::{
    CloneError, CloneOrchestrator, CloneResult, CloneStage, ContentValidator, EntityGraph,
    HubAccessGuard, HubService, SchemaDescriptor, ServiceError, ValidationErrors, Validator,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{EntityStore, InMemoryStore, PostgresStore, StoreTransaction};

use crate::config::AppConfig;

/// Initialise env_logger at the configured level, keeping sqlx quiet
pub fn init_logging(config: &AppConfig) {
    let _ = env_logger::Builder::new()
        .filter_level(config.log_level())
        .filter_module("sqlx", log::LevelFilter::Warn)
        .try_init();
}

/// Build the service over `store`, seed it when configured, and serve HTTP until shutdown
pub async fn serve<S: EntityStore + 'static>(store: S, config: &AppConfig) -> anyhow::Result<()> {
    use axum::serve;
    use tokio::net::TcpListener;

    if config.seed.load {
        log::info!("Loading seed data...");
        seed::load_seed_data(&store).await?;
    }

    let service = HubService::new(Arc::new(store), SchemaDescriptor::standard()?);
    let app = api::routes::create_router().with_state(Arc::new(service));

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Content hub listening on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}

/// Load configuration, pick the store and run the server
pub async fn run_server() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config);

    match config.database_url() {
        Some(database_url) => {
            let store =
                PostgresStore::new(&database_url, config.database.max_connections).await?;
            store.migrate().await?;
            serve(store, &config).await
        }
        None => {
            log::warn!("No database configured, content is kept in memory only");
            serve(InMemoryStore::new(), &config).await
        }
    }
}
