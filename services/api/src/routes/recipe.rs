//! Recipe endpoints

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::recipe::{RecipeDetail, RecipeImage, RecipePayload, RecipeQuery, RecipeSummary},
    storage::{recipe_image_path, validate_image},
};

/// Multipart field carrying the uploaded file
const IMAGE_FIELD: &str = "image";

/// List the caller's recipes, optionally filtered by tag or ingredient IDs
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<RecipeQuery>, ApiError>,
) -> ApiResult<Json<Vec<RecipeSummary>>> {
    let filter = query.into_filter()?;
    let recipes = state.recipe_repository.list(user.id, &filter).await?;

    Ok(Json(recipes))
}

/// Create a recipe owned by the caller
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<RecipePayload>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let recipe = payload.into_new_recipe()?;
    let created = state.recipe_repository.create(user.id, &recipe).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch one recipe with its tags and ingredients
pub async fn retrieve_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<RecipeDetail>> {
    let recipe = state
        .recipe_repository
        .get(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(recipe))
}

/// Full update
pub async fn replace_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<RecipePayload>, ApiError>,
) -> ApiResult<Json<RecipeDetail>> {
    apply_changes(&state, user, id, payload, false).await
}

/// Partial update
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<RecipePayload>, ApiError>,
) -> ApiResult<Json<RecipeDetail>> {
    apply_changes(&state, user, id, payload, true).await
}

async fn apply_changes(
    state: &AppState,
    user: AuthUser,
    id: i64,
    payload: RecipePayload,
    partial: bool,
) -> ApiResult<Json<RecipeDetail>> {
    let changes = payload.validate(partial)?;
    let recipe = state
        .recipe_repository
        .update(user.id, id, &changes)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(recipe))
}

/// Delete a recipe and its stored image
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<StatusCode> {
    let recipe = state
        .recipe_repository
        .delete(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(image) = recipe.image {
        if let Err(e) = state.image_store.remove(&image).await {
            warn!("Failed to remove image {} of recipe {}: {}", image, id, e);
        }
    }

    info!("Deleted recipe {} for user {}", id, user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Attach an uploaded image to a recipe
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<Json<RecipeImage>> {
    if !state.recipe_repository.exists(user.id, id).await? {
        return Err(ApiError::NotFound);
    }

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::field(IMAGE_FIELD, "No file was submitted."))?;
    if bytes.is_empty() {
        return Err(ApiError::field(IMAGE_FIELD, "The submitted file is empty."));
    }

    let checked = bytes.clone();
    let format = tokio::task::spawn_blocking(move || validate_image(&checked))
        .await
        .map_err(|e| {
            error!("Image validation task failed: {}", e);
            ApiError::InternalServerError
        })?
        .map_err(|e| {
            info!("Rejected upload for recipe {}: {}", id, e);
            ApiError::field(
                IMAGE_FIELD,
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            )
        })?;

    let path = recipe_image_path(file_name.as_deref(), format);
    state.image_store.save(&path, &bytes).await.map_err(|e| {
        error!("Failed to store image {}: {}", path, e);
        ApiError::InternalServerError
    })?;

    let updated = match state.recipe_repository.set_image(user.id, id, &path).await {
        Ok(Some(updated)) => updated,
        outcome => {
            if let Err(e) = state.image_store.remove(&path).await {
                warn!("Failed to clean up image {}: {}", path, e);
            }
            return Err(outcome.err().map(ApiError::from).unwrap_or(ApiError::NotFound));
        }
    };

    info!("Stored image {} for recipe {}", path, id);
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use crate::{
        AppState,
        models::recipe::NewRecipe,
        routes::create_router,
        storage::ImageStore,
    };
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use common::token::{TokenConfig, TokenService};
    use image::{ImageFormat, RgbImage};
    use rust_decimal::Decimal;
    use sqlx::PgPool;
    use std::{io::Cursor, path::PathBuf};
    use tower::ServiceExt;
    use uuid::Uuid;

    const BOUNDARY: &str = "recipe-upload-boundary";
    const UPLOAD_LIMIT: usize = 64 * 1024;

    struct Harness {
        state: AppState,
        media_root: PathBuf,
        user_id: i64,
        token: String,
    }

    impl Harness {
        async fn new(pool: PgPool) -> Self {
            let user_id: i64 = sqlx::query_scalar(
                "INSERT INTO users (email, password_hash) VALUES ('user@example.com', 'x') RETURNING id",
            )
            .fetch_one(&pool)
            .await
            .unwrap();

            let token_service = TokenService::new(TokenConfig {
                secret: "test-secret".to_string(),
                expiry: 60,
            });
            let token = token_service.issue(user_id).unwrap();
            let media_root = std::env::temp_dir().join(format!("recipe-media-{}", Uuid::new_v4()));
            let state = AppState::new(pool, token_service, ImageStore::new(&media_root));

            Self {
                state,
                media_root,
                user_id,
                token,
            }
        }

        fn router(&self) -> Router {
            create_router(self.state.clone(), UPLOAD_LIMIT)
        }

        async fn create_recipe(&self) -> i64 {
            self.state
                .recipe_repository
                .create(
                    self.user_id,
                    &NewRecipe {
                        title: "Sample recipe".to_string(),
                        time_minutes: 5,
                        price: Decimal::new(550, 2),
                        description: String::new(),
                        link: String::new(),
                        tags: vec![],
                        ingredients: vec![],
                    },
                )
                .await
                .unwrap()
                .id
        }

        async fn upload(&self, recipe_id: i64, file_name: &str, bytes: &[u8]) -> Response {
            let mut body = format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .into_bytes();
            body.extend_from_slice(bytes);
            body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

            let request = Request::post(format!("/recipe/recipes/{}/upload-image/", recipe_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap();

            self.router().oneshot(request).await.unwrap()
        }

        async fn delete(&self, recipe_id: i64) -> StatusCode {
            let request = Request::delete(format!("/recipe/recipes/{}/", recipe_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
                .body(Body::empty())
                .unwrap();

            self.router().oneshot(request).await.unwrap().status()
        }

        async fn stored_image(&self, recipe_id: i64) -> Option<String> {
            self.state
                .recipe_repository
                .get(self.user_id, recipe_id)
                .await
                .unwrap()
                .unwrap()
                .image
        }

        async fn cleanup(self) {
            let _ = tokio::fs::remove_dir_all(&self.media_root).await;
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::new(10, 10)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_upload_invalid_image_leaves_recipe_untouched(pool: PgPool) {
        let harness = Harness::new(pool).await;
        let recipe_id = harness.create_recipe().await;

        let response = harness.upload(recipe_id, "sample.png", b"notanimage").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["fields"]["image"].is_array());
        assert!(harness.stored_image(recipe_id).await.is_none());

        harness.cleanup().await;
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_upload_then_delete_removes_file(pool: PgPool) {
        let harness = Harness::new(pool).await;
        let recipe_id = harness.create_recipe().await;

        let response = harness.upload(recipe_id, "sample.png", &png_bytes()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let image = body["image"].as_str().unwrap().to_string();
        assert!(image.starts_with("uploads/recipe/"));
        assert!(image.ends_with(".png"));
        assert_eq!(harness.stored_image(recipe_id).await.as_deref(), Some(image.as_str()));

        let stored = harness.media_root.join(&image);
        assert!(stored.exists());

        assert_eq!(harness.delete(recipe_id).await, StatusCode::NO_CONTENT);
        assert!(!stored.exists());

        harness.cleanup().await;
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_upload_with_long_extension_is_stored(pool: PgPool) {
        let harness = Harness::new(pool).await;
        let recipe_id = harness.create_recipe().await;
        let file_name = format!("photo.{}", "a".repeat(300));

        let response = harness.upload(recipe_id, &file_name, &png_bytes()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let image = harness.stored_image(recipe_id).await.unwrap();
        assert!(image.ends_with(".png"));
        assert!(harness.media_root.join(&image).exists());

        harness.cleanup().await;
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_upload_over_limit_is_payload_too_large(pool: PgPool) {
        let harness = Harness::new(pool).await;
        let recipe_id = harness.create_recipe().await;

        let oversized = vec![0u8; UPLOAD_LIMIT * 2];
        let response = harness.upload(recipe_id, "big.png", &oversized).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(harness.stored_image(recipe_id).await.is_none());

        harness.cleanup().await;
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a running PostgreSQL server"]
    async fn test_upload_to_missing_recipe_is_not_found(pool: PgPool) {
        let harness = Harness::new(pool).await;

        let response = harness.upload(9999, "sample.png", &png_bytes()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        harness.cleanup().await;
    }
}
