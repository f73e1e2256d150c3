//! Tag and ingredient repository
//!
//! Both catalogs share one implementation; table names come from
//! `CatalogKind` and are never taken from user input.

use std::collections::{HashMap, HashSet};

use common::error::DatabaseResult;
use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::info;

use crate::models::catalog::{CatalogItem, CatalogKind};

/// Repository for one catalog kind
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
    kind: CatalogKind,
}

impl CatalogRepository {
    pub fn new(pool: PgPool, kind: CatalogKind) -> Self {
        Self { pool, kind }
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    /// List the owner's entries by descending name
    ///
    /// With `assigned_only` set, entries not linked to any recipe are left out.
    pub async fn list(&self, user_id: i64, assigned_only: bool) -> DatabaseResult<Vec<CatalogItem>> {
        let sql = format!(
            r#"
            SELECT c.id, c.name
            FROM {table} c
            WHERE c.user_id = $1
              AND (NOT $2 OR EXISTS (
                  SELECT 1 FROM {link} l WHERE l.{column} = c.id
              ))
            ORDER BY c.name DESC, c.id DESC
            "#,
            table = self.kind.table(),
            link = self.kind.link_table(),
            column = self.kind.link_column(),
        );

        let items = sqlx::query_as::<_, CatalogItem>(&sql)
            .bind(user_id)
            .bind(assigned_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Fetch one of the owner's entries
    pub async fn get(&self, user_id: i64, id: i64) -> DatabaseResult<Option<CatalogItem>> {
        let sql = format!(
            "SELECT id, name FROM {} WHERE id = $1 AND user_id = $2",
            self.kind.table()
        );

        let item = sqlx::query_as::<_, CatalogItem>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Rename one of the owner's entries; `None` keeps the stored name
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        name: Option<&str>,
    ) -> DatabaseResult<Option<CatalogItem>> {
        let sql = format!(
            r#"
            UPDATE {}
            SET name = COALESCE($3, name)
            WHERE id = $1 AND user_id = $2
            RETURNING id, name
            "#,
            self.kind.table()
        );

        let item = sqlx::query_as::<_, CatalogItem>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Delete one of the owner's entries; recipe links go with it
    pub async fn delete(&self, user_id: i64, id: i64) -> DatabaseResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND user_id = $2",
            self.kind.table()
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Return the owner's entry with this exact name, creating it if needed
    pub async fn get_or_create(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
        name: &str,
    ) -> DatabaseResult<CatalogItem> {
        let select = format!(
            r#"
            SELECT id, name
            FROM {}
            WHERE user_id = $1 AND name = $2
            ORDER BY id
            LIMIT 1
            "#,
            self.kind.table()
        );

        let existing = sqlx::query_as::<_, CatalogItem>(&select)
            .bind(user_id)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(item) = existing {
            return Ok(item);
        }

        let insert = format!(
            "INSERT INTO {} (name, user_id) VALUES ($1, $2) RETURNING id, name",
            self.kind.table()
        );

        let item = sqlx::query_as::<_, CatalogItem>(&insert)
            .bind(name)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

        info!("Created {} {} for user {}", self.kind.field(), item.id, user_id);
        Ok(item)
    }

    /// Resolve nested names to entry IDs, first occurrence wins
    pub async fn resolve_names(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
        names: &[String],
    ) -> DatabaseResult<Vec<i64>> {
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(names.len());

        for name in names {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let item = self.get_or_create(conn, user_id, name).await?;
            ids.push(item.id);
        }

        Ok(ids)
    }

    /// Make `ids` the complete set of entries linked to a recipe
    pub async fn replace_links(
        &self,
        conn: &mut PgConnection,
        recipe_id: i64,
        ids: &[i64],
    ) -> DatabaseResult<()> {
        let delete = format!("DELETE FROM {} WHERE recipe_id = $1", self.kind.link_table());
        sqlx::query(&delete)
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;

        if ids.is_empty() {
            return Ok(());
        }

        let insert = format!(
            r#"
            INSERT INTO {link} (recipe_id, {column})
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
            link = self.kind.link_table(),
            column = self.kind.link_column(),
        );
        sqlx::query(&insert)
            .bind(recipe_id)
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Entries linked to each of the given recipes, keyed by recipe ID
    pub async fn for_recipes<'e, E>(
        &self,
        executor: E,
        recipe_ids: &[i64],
    ) -> DatabaseResult<HashMap<i64, Vec<CatalogItem>>>
    where
        E: PgExecutor<'e>,
    {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            r#"
            SELECT l.recipe_id, c.id, c.name
            FROM {link} l
            JOIN {table} c ON c.id = l.{column}
            WHERE l.recipe_id = ANY($1)
            ORDER BY c.id
            "#,
            link = self.kind.link_table(),
            table = self.kind.table(),
            column = self.kind.link_column(),
        );

        let rows = sqlx::query_as::<_, (i64, i64, String)>(&sql)
            .bind(recipe_ids)
            .fetch_all(executor)
            .await?;

        let mut linked: HashMap<i64, Vec<CatalogItem>> = HashMap::new();
        for (recipe_id, id, name) in rows {
            linked
                .entry(recipe_id)
                .or_default()
                .push(CatalogItem { id, name });
        }

        Ok(linked)
    }
}
