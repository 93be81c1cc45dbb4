//! Authentication error kinds and their HTTP rendering.
//!
//! Input problems carry specific, safe messages. Infrastructure failures are
//! logged in full here and reach the caller only as a generic server error.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::auth::{password::HashError, repo::StoreError, validation::FieldError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid input")]
    Validation(Vec<FieldError>),
    #[error("user already exists")]
    DuplicateUser,
    #[error("user not found")]
    NotFound,
    #[error("invalid verification token")]
    InvalidToken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email not verified")]
    UnverifiedAccount,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("notifier error: {0}")]
    Notifier(anyhow::Error),
}

impl AuthError {
    /// Machine-readable discriminant sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::DuplicateUser => "duplicate_user",
            Self::NotFound => "not_found",
            Self::InvalidToken => "invalid_token",
            Self::InvalidCredentials => "invalid_credentials",
            Self::UnverifiedAccount => "unverified_account",
            Self::Store(_) | Self::Hash(_) | Self::Token(_) | Self::Notifier(_) => "server_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::DuplicateUser
            | Self::InvalidToken
            | Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UnverifiedAccount => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Hash(_) | Self::Token(_) | Self::Notifier(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Caller-facing text. Never includes infrastructure detail.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid input",
            Self::DuplicateUser => "User already exists",
            Self::NotFound => "User not found",
            Self::InvalidToken => "Invalid verification token",
            Self::InvalidCredentials => "Invalid credentials",
            Self::UnverifiedAccount => "Email not verified",
            Self::Store(_) | Self::Hash(_) | Self::Token(_) | Self::Notifier(_) => "Server error",
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request body");
        Self::Validation(vec![FieldError::new(
            "body",
            "Request body must be a JSON object",
        )])
    }
}

impl From<QueryRejection> for AuthError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected query string");
        Self::Validation(vec![FieldError::new("query", "Malformed query string")])
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, kind = self.kind(), "request failed");
        }
        let body = match &self {
            Self::Validation(errors) => json!({
                "kind": self.kind(),
                "message": self.message(),
                "errors": errors,
            }),
            _ => json!({ "kind": self.kind(), "message": self.message() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_errors_are_opaque() {
        let err = AuthError::Store(StoreError::Conflict);
        assert_eq!(err.kind(), "server_error");
        assert_eq!(err.message(), "Server error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AuthError::Notifier(anyhow::anyhow!("smtp 535 bad credentials"));
        assert_eq!(err.message(), "Server error");
    }

    #[test]
    fn unverified_is_distinct_from_invalid_credentials() {
        assert_eq!(AuthError::UnverifiedAccount.status_code(), StatusCode::FORBIDDEN);
        assert_ne!(
            AuthError::UnverifiedAccount.kind(),
            AuthError::InvalidCredentials.kind()
        );
    }
}
