//! API service routes
//!
//! Every `/recipe/*` route requires a bearer token and only ever sees the
//! caller's own records; anything owned by someone else answers 404.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::{AppState, middleware::auth_middleware};

pub mod catalog;
pub mod recipe;

/// Create the router for the API service
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let protected_routes = Router::new()
        .route(
            "/recipe/recipes/",
            get(recipe::list_recipes).post(recipe::create_recipe),
        )
        .route(
            "/recipe/recipes/:id/",
            get(recipe::retrieve_recipe)
                .put(recipe::replace_recipe)
                .patch(recipe::update_recipe)
                .delete(recipe::delete_recipe),
        )
        .route(
            "/recipe/recipes/:id/upload-image/",
            post(recipe::upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .merge(catalog::router(state.tag_repository.clone()))
        .merge(catalog::router(state.ingredient_repository.clone()))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}
