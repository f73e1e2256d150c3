use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod middleware;
mod models;
mod password;
mod repositories;
mod routes;
mod settings;
mod validation;

use common::{
    database::{self, DatabaseConfig, ReadinessPolicy},
    token::{TokenConfig, TokenService},
};

use crate::{repositories::UserRepository, settings::Settings};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub token_service: TokenService,
    pub user_repository: UserRepository,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

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
    let user_repository = UserRepository::new(pool);

    if let Some((email, password)) = settings.superuser() {
        let user = user_repository.ensure_superuser(email, password).await?;
        info!("Superuser account ready: {}", user.email);
    }

    let app_state = AppState {
        token_service,
        user_repository,
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Authentication service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
