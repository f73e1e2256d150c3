//! Middleware for bearer token validation and authentication

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{error, info};

use crate::{AppState, error::AuthError};

/// Validate the bearer token and attach the caller's `User` to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;

    let claims = state
        .token_service
        .validate(bearer.token())
        .map_err(|e| {
            info!("Rejected bearer token: {}", e);
            AuthError::Unauthorized
        })?;

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", claims.sub, e);
            AuthError::InternalServerError
        })?
        .filter(|user| user.is_active)
        .ok_or(AuthError::Unauthorized)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
