//! Block until PostgreSQL accepts connections, or give up after the
//! configured number of attempts. Always exits successfully; the outcome is
//! only reported in the log.

use anyhow::Result;
use common::database::{DatabaseConfig, ReadinessPolicy, wait_for_db};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = DatabaseConfig::from_env()?;
    let available = wait_for_db(&config, &ReadinessPolicy::default()).await;
    info!("Readiness probe finished, database available: {}", available);

    Ok(())
}
