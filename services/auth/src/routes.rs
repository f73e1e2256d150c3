//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use common::error::FieldErrors;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    middleware::auth_middleware,
    models::{LoginCredentials, NewUser, UpdateUser, User, UserProfile},
    validation::{normalize_email, validate_email, validate_name, validate_password},
};

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl CreateUserRequest {
    fn validate(self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = normalize_email(self.email.as_deref().unwrap_or_default());
        if let Err(msg) = validate_email(&email) {
            errors.add("email", msg);
        }

        let password = self.password.unwrap_or_default();
        if let Err(msg) = validate_password(&password) {
            errors.add("password", msg);
        }

        let name = self.name.unwrap_or_default();
        if let Err(msg) = validate_name(&name) {
            errors.add("name", msg);
        }

        errors.into_result(NewUser {
            email,
            password,
            name,
        })
    }
}

/// Request for a profile update
///
/// `PUT` requires `email` and `password`; `PATCH` accepts any subset.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl UpdateProfileRequest {
    fn validate(self, partial: bool) -> Result<UpdateUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        if !partial {
            if self.email.is_none() {
                errors.add("email", "Email is required");
            }
            if self.password.is_none() {
                errors.add("password", "Password is required");
            }
        }

        let email = self.email.map(|email| normalize_email(&email));
        if let Some(Err(msg)) = email.as_deref().map(validate_email) {
            errors.add("email", msg);
        }
        if let Some(Err(msg)) = self.password.as_deref().map(validate_password) {
            errors.add("password", msg);
        }
        if let Some(Err(msg)) = self.name.as_deref().map(validate_name) {
            errors.add("name", msg);
        }

        errors.into_result(UpdateUser {
            email,
            name: self.name,
            password: self.password,
        })
    }
}

/// Response for token generation
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/user/me/",
            get(retrieve_profile)
                .put(replace_profile)
                .patch(update_profile),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/user/create/", post(create_user))
        .route("/user/token/", post(create_token))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Register a new account
pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateUserRequest>, AuthError>,
) -> AuthResult<impl IntoResponse> {
    let new_user = payload.validate()?;
    let user = state.user_repository.create_user(&new_user).await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// Exchange credentials for a bearer token
pub async fn create_token(
    State(state): State<AppState>,
    WithRejection(Json(credentials), _): WithRejection<Json<LoginCredentials>, AuthError>,
) -> AuthResult<Json<TokenResponse>> {
    let user = state
        .user_repository
        .authenticate(&credentials.email, &credentials.password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let token = state.token_service.issue(user.id).map_err(|e| {
        error!("Failed to issue token: {}", e);
        AuthError::InternalServerError
    })?;

    info!("Issued token for user {}", user.id);
    Ok(Json(TokenResponse { token }))
}

/// Return the caller's profile
pub async fn retrieve_profile(Extension(user): Extension<User>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// Full profile update
pub async fn replace_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateProfileRequest>, AuthError>,
) -> AuthResult<Json<UserProfile>> {
    apply_profile_update(&state, &user, payload.validate(false)?).await
}

/// Partial profile update
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateProfileRequest>, AuthError>,
) -> AuthResult<Json<UserProfile>> {
    apply_profile_update(&state, &user, payload.validate(true)?).await
}

async fn apply_profile_update(
    state: &AppState,
    user: &User,
    changes: UpdateUser,
) -> AuthResult<Json<UserProfile>> {
    let updated = state
        .user_repository
        .update_profile(user.id, &changes)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    Ok(Json(UserProfile::from(&updated)))
}
