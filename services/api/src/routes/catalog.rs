//! Tag and ingredient endpoints

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::catalog::{CatalogItem, CatalogQuery, CatalogUpdateRequest},
    repositories::CatalogRepository,
};

/// Routes for one catalog, mounted under `/recipe/{tags,ingredients}/`
pub fn router(repository: CatalogRepository) -> Router<AppState> {
    let kind = repository.kind();
    let collection = format!("/recipe/{}/", kind.field());
    let member = format!("/recipe/{}/:id/", kind.field());

    Router::new()
        .route(&collection, get(list_items))
        .route(
            &member,
            get(retrieve_item)
                .put(replace_item)
                .patch(update_item)
                .delete(delete_item),
        )
        .with_state(repository)
}

/// List the caller's entries
pub async fn list_items(
    State(repository): State<CatalogRepository>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<CatalogQuery>, ApiError>,
) -> ApiResult<Json<Vec<CatalogItem>>> {
    let items = repository.list(user.id, query.assigned_only()?).await?;
    Ok(Json(items))
}

/// Fetch one entry
pub async fn retrieve_item(
    State(repository): State<CatalogRepository>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<CatalogItem>> {
    let item = repository
        .get(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(item))
}

/// Full update
pub async fn replace_item(
    State(repository): State<CatalogRepository>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<CatalogUpdateRequest>, ApiError>,
) -> ApiResult<Json<CatalogItem>> {
    rename(&repository, user, id, payload.validate(false)?).await
}

/// Partial update
pub async fn update_item(
    State(repository): State<CatalogRepository>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<CatalogUpdateRequest>, ApiError>,
) -> ApiResult<Json<CatalogItem>> {
    rename(&repository, user, id, payload.validate(true)?).await
}

async fn rename(
    repository: &CatalogRepository,
    user: AuthUser,
    id: i64,
    name: Option<String>,
) -> ApiResult<Json<CatalogItem>> {
    let item = repository
        .update(user.id, id, name.as_deref())
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(item))
}

/// Delete an entry; recipes that used it simply lose the link
pub async fn delete_item(
    State(repository): State<CatalogRepository>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<StatusCode> {
    if !repository.delete(user.id, id).await? {
        return Err(ApiError::NotFound);
    }

    info!("Deleted {} {} for user {}", repository.kind().field(), id, user.id);
    Ok(StatusCode::NO_CONTENT)
}
