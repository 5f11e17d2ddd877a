use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Failures at the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl StoreError {
    /// Maps a raw sqlx error, turning unique violations into `DuplicateEmail`.
    pub fn from_insert(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Errors surfaced by the auth flow and rendered by the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are never told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("forbidden")]
    Forbidden,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::Conflict("Email already registered".into()),
            other => AuthError::Store(other),
        }
    }
}

/// Malformed or incomplete request bodies are a client error like any other.
impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::Validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Store(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            AuthError::InvalidCredentials => ("invalid_credentials", "Invalid credentials".into()),
            AuthError::Unauthorized(reason) => ("unauthorized", reason.to_string()),
            AuthError::Forbidden => ("forbidden", "Admin role required".into()),
            AuthError::Validation(msg) => ("bad_request", msg),
            AuthError::Conflict(msg) => ("conflict", msg),
            AuthError::Store(e) => {
                error!(error = %e, "store failure");
                ("internal_error", "An internal error occurred".into())
            }
            AuthError::Internal(msg) => {
                error!(error = %msg, "internal failure");
                ("internal_error", "An internal error occurred".into())
            }
        };

        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_becomes_conflict() {
        let err: AuthError = StoreError::DuplicateEmail.into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_failures_hide_details() {
        let err: AuthError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_database_errors_are_not_duplicates() {
        let err = StoreError::from_insert(sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn guard_rejections_map_to_401_and_403() {
        assert_eq!(
            AuthError::Unauthorized("missing Authorization header").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }
}
