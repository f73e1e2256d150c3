use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod settings;
mod state;
mod storage;

use common::{
    database::{self, DatabaseConfig, ReadinessPolicy},
    token::{TokenConfig, TokenService},
};

use crate::{settings::Settings, storage::ImageStore};

pub use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let settings = Settings::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    if !database::wait_for_db(&db_config, &ReadinessPolicy::default()).await {
        warn!("Database did not become ready, attempting to connect anyway");
    }
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    let token_service = TokenService::new(TokenConfig::from_env()?);
    let image_store = ImageStore::new(&settings.media_root);
    info!("Storing uploads under {}", settings.media_root.display());

    let app_state = AppState::new(pool, token_service, image_store);

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state, settings.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("API service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
