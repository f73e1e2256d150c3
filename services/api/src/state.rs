//! Application state shared across handlers

use common::token::TokenService;
use sqlx::PgPool;

use crate::{
    models::catalog::CatalogKind,
    repositories::{CatalogRepository, RecipeRepository, UserRepository},
    storage::ImageStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub token_service: TokenService,
    pub user_repository: UserRepository,
    pub tag_repository: CatalogRepository,
    pub ingredient_repository: CatalogRepository,
    pub recipe_repository: RecipeRepository,
    pub image_store: ImageStore,
}

impl AppState {
    pub fn new(pool: PgPool, token_service: TokenService, image_store: ImageStore) -> Self {
        Self {
            token_service,
            user_repository: UserRepository::new(pool.clone()),
            tag_repository: CatalogRepository::new(pool.clone(), CatalogKind::Tag),
            ingredient_repository: CatalogRepository::new(pool.clone(), CatalogKind::Ingredient),
            recipe_repository: RecipeRepository::new(pool),
            image_store,
        }
    }
}
