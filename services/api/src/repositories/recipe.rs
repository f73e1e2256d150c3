//! Recipe repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::{
    models::{
        catalog::CatalogKind,
        recipe::{
            NewRecipe, RecipeChanges, RecipeDetail, RecipeFilter, RecipeImage, RecipeRow,
            RecipeSummary,
        },
    },
    repositories::CatalogRepository,
};

const RECIPE_COLUMNS: &str =
    "id, user_id, title, time_minutes, price, description, link, image";

/// Recipe repository
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
    tags: CatalogRepository,
    ingredients: CatalogRepository,
}

impl RecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: PgPool) -> Self {
        Self {
            tags: CatalogRepository::new(pool.clone(), CatalogKind::Tag),
            ingredients: CatalogRepository::new(pool.clone(), CatalogKind::Ingredient),
            pool,
        }
    }

    /// List the owner's recipes, newest first
    ///
    /// Each set filter keeps recipes linked to at least one of its IDs, and
    /// a recipe matching several IDs appears once.
    pub async fn list(
        &self,
        user_id: i64,
        filter: &RecipeFilter,
    ) -> DatabaseResult<Vec<RecipeSummary>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes r
            WHERE r.user_id = $1
              AND ($2::BIGINT[] IS NULL OR EXISTS (
                  SELECT 1 FROM recipe_tags rt
                  WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)
              ))
              AND ($3::BIGINT[] IS NULL OR EXISTS (
                  SELECT 1 FROM recipe_ingredients ri
                  WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)
              ))
            ORDER BY r.id DESC
            "#
        ))
        .bind(user_id)
        .bind(&filter.tags)
        .bind(&filter.ingredients)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut tags = self.tags.for_recipes(&self.pool, &ids).await?;

        let recipes = rows
            .into_iter()
            .map(|row| RecipeSummary {
                tags: tags.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                time_minutes: row.time_minutes,
                price: row.price,
                link: row.link,
            })
            .collect();

        Ok(recipes)
    }

    /// Fetch one of the owner's recipes with its tags and ingredients
    pub async fn get(&self, user_id: i64, id: i64) -> DatabaseResult<Option<RecipeDetail>> {
        let mut conn = self.pool.acquire().await?;
        self.load(&mut conn, user_id, id).await
    }

    /// Whether the owner has a recipe with this ID
    pub async fn exists(&self, user_id: i64, id: i64) -> DatabaseResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM recipes WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a recipe and its nested tags and ingredients in one transaction
    pub async fn create(&self, user_id: i64, recipe: &NewRecipe) -> DatabaseResult<RecipeDetail> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price, description, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&recipe.title)
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(&recipe.description)
        .bind(&recipe.link)
        .fetch_one(&mut *tx)
        .await?;

        self.link(&mut tx, &self.tags, user_id, id, &recipe.tags).await?;
        self.link(&mut tx, &self.ingredients, user_id, id, &recipe.ingredients)
            .await?;

        let detail = self
            .load(&mut tx, user_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        tx.commit().await?;

        info!("Created recipe {} for user {}", id, user_id);
        Ok(detail)
    }

    /// Apply changes to one of the owner's recipes
    ///
    /// A `Some` tag or ingredient list replaces the whole relation; `None`
    /// leaves it as stored.
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        changes: &RecipeChanges,
    ) -> DatabaseResult<Option<RecipeDetail>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE recipes
            SET title = COALESCE($3, title),
                time_minutes = COALESCE($4, time_minutes),
                price = COALESCE($5, price),
                description = COALESCE($6, description),
                link = COALESCE($7, link),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&changes.title)
        .bind(changes.time_minutes)
        .bind(changes.price)
        .bind(&changes.description)
        .bind(&changes.link)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(names) = &changes.tags {
            self.link(&mut tx, &self.tags, user_id, id, names).await?;
        }
        if let Some(names) = &changes.ingredients {
            self.link(&mut tx, &self.ingredients, user_id, id, names)
                .await?;
        }

        let detail = self.load(&mut tx, user_id, id).await?;
        tx.commit().await?;

        Ok(detail)
    }

    /// Delete one of the owner's recipes, returning the removed row
    ///
    /// Link rows go with the recipe; the tags and ingredients stay.
    pub async fn delete(&self, user_id: i64, id: i64) -> DatabaseResult<Option<RecipeRow>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "DELETE FROM recipes WHERE id = $1 AND user_id = $2 RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Point the recipe at a stored image
    pub async fn set_image(
        &self,
        user_id: i64,
        id: i64,
        image: &str,
    ) -> DatabaseResult<Option<RecipeImage>> {
        let recipe = sqlx::query_as::<_, RecipeImage>(
            r#"
            UPDATE recipes
            SET image = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, image
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(image)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipe)
    }

    async fn link(
        &self,
        conn: &mut PgConnection,
        catalog: &CatalogRepository,
        user_id: i64,
        recipe_id: i64,
        names: &[String],
    ) -> DatabaseResult<()> {
        let ids = catalog.resolve_names(conn, user_id, names).await?;
        catalog.replace_links(conn, recipe_id, &ids).await
    }

    async fn load(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
        id: i64,
    ) -> DatabaseResult<Option<RecipeDetail>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags = self
            .tags
            .for_recipes(&mut *conn, &[row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();
        let ingredients = self
            .ingredients
            .for_recipes(&mut *conn, &[row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();

        Ok(Some(RecipeDetail::new(row, tags, ingredients)))
    }
}
