//! Repositories for database operations

use common::error::DatabaseResult;
use sqlx::PgPool;

pub mod catalog;
pub mod recipe;

pub use catalog::CatalogRepository;
pub use recipe::RecipeRepository;

/// Read-only access to accounts managed by the auth service
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether the account is active; `None` when it no longer exists
    pub async fn is_active(&self, id: i64) -> DatabaseResult<Option<bool>> {
        let active = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(active)
    }
}
