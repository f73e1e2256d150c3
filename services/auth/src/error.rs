//! Error types for the authentication service

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::{DatabaseError, FieldErrors};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures raised by the identity store
#[derive(Error, Debug)]
pub enum UserError {
    /// A field failed a model-level check
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Another account already uses the normalized email
    #[error("A user with this email already exists")]
    EmailTaken,

    /// Password hashing failed
    #[error("Failed to hash password: {0}")]
    Hashing(String),

    /// Database error
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for UserError {
    fn from(e: sqlx::Error) -> Self {
        let e = DatabaseError::from(e);
        if e.is_unique_violation() {
            UserError::EmailTaken
        } else {
            UserError::Database(e)
        }
    }
}

/// Error type returned by the HTTP handlers
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing, invalid or expired bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Credentials did not match an active account
    #[error("Unable to authenticate with provided credentials")]
    InvalidCredentials,

    /// Request fields failed validation
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Malformed request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<UserError> for AuthError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Validation { field, message } => {
                AuthError::Validation(FieldErrors::single(field, message))
            }
            UserError::EmailTaken => AuthError::Validation(FieldErrors::single(
                "email",
                "A user with this email already exists",
            )),
            UserError::Hashing(msg) => {
                error!("Failed to hash password: {}", msg);
                AuthError::InternalServerError
            }
            UserError::Database(e) => AuthError::Database(e),
        }
    }
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        AuthError::Validation(errors)
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            AuthError::Unauthorized | AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, json!({ "error": message }))
            }
            AuthError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "fields": fields }),
            ),
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
            AuthError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for handler results
pub type AuthResult<T> = Result<T, AuthError>;
