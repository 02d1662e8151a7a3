use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Why a bearer token was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Access token is missing")]
    Missing,
    /// Well-formed, but not the active session of any user.
    #[error("Authorization error")]
    Unknown,
    #[error("Invalid token")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
}

/// Errors returned by persistence backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Duplicate,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Backend(e.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Username already taken")]
    Duplicate,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("password comparison failed: {0}")]
    Comparison(String),
    #[error("token issuance failed: {0}")]
    Issuance(String),
    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AppError::Duplicate,
            StoreError::Backend(e) => AppError::Storage(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidPassword | AppError::Duplicate => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Token(TokenError::Missing) => StatusCode::UNAUTHORIZED,
            AppError::Token(_) => StatusCode::FORBIDDEN,
            AppError::Hashing(_)
            | AppError::Comparison(_)
            | AppError::Issuance(_)
            | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the logs.
        let message = match &self {
            AppError::Issuance(_) => {
                error!(error = %self, "internal error");
                "Couldn't create access token. Please try again later.".to_string()
            }
            AppError::Hashing(_) | AppError::Comparison(_) | AppError::Storage(_) => {
                error!(error = %self, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": true, "message": message }))).into_response()
    }
}
