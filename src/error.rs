use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::services::history_service::DuplicateReport;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid CPF: {0}")]
    InvalidCpf(String),

    #[error("Invalid pipeline stage: {0}")]
    InvalidStage(String),

    #[error("Score must be between 0 and 10, got {0}")]
    InvalidScore(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Candidate has {} previous application(s) on record", .0.matches.len())]
    DuplicateCandidate(DuplicateReport),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        if let Error::DuplicateCandidate(report) = &self {
            let body = Json(json!({ "error": self.to_string(), "duplicate": report }));
            return (StatusCode::CONFLICT, body).into_response();
        }

        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg),
            err @ (Error::InvalidCpf(_) | Error::InvalidStage(_) | Error::InvalidScore(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Error::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Token(_) => (StatusCode::UNAUTHORIZED, "invalid_token".to_string()),
            Error::Database(err) => {
                tracing::error!(error = ?err, "database operation failed");
                describe_database_error(&err)
            }
            Error::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            Error::Io(err) => {
                tracing::error!(error = ?err, "io failure");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            Error::Xlsx(err) => {
                tracing::error!(error = ?err, "export failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Export error: {}", err))
            }
            other => {
                tracing::error!(error = %other, "unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

/// Best-effort readable message for known PostgreSQL SQLSTATE codes.
pub fn describe_database_error(err: &sqlx::Error) -> (StatusCode, String) {
    let code = match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    };
    match code.as_deref() {
        Some(code) => describe_sqlstate(code),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database operation failed, please try again".to_string(),
        ),
    }
}

fn describe_sqlstate(code: &str) -> (StatusCode, String) {
    match code {
        "23505" => (
            StatusCode::CONFLICT,
            "A record with these details already exists".to_string(),
        ),
        "23503" => (
            StatusCode::CONFLICT,
            "The referenced record no longer exists".to_string(),
        ),
        "23502" => (
            StatusCode::BAD_REQUEST,
            "A required field is missing".to_string(),
        ),
        "22P02" => (
            StatusCode::BAD_REQUEST,
            "A value has an invalid format".to_string(),
        ),
        "42501" => (
            StatusCode::FORBIDDEN,
            "Permission denied for this operation".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database operation failed, please try again".to_string(),
        ),
    }
}
