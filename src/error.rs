use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Connectivity error: {0}")]
    ConnectivityError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Identity error: {0}")]
    IdentityError(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Policy error: {0}")]
    PolicyError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    /// Short machine-readable kind, used in diagnostic details.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigurationError(_) => "configuration",
            AppError::ConnectivityError(_) => "connectivity",
            AppError::SchemaError(_) => "schema",
            AppError::IdentityError(_) => "identity",
            AppError::CredentialError(_) => "credential",
            AppError::PolicyError(_) => "policy",
            AppError::DatabaseError(_) => "database",
            AppError::AuthError(_) => "auth",
            AppError::ValidationError(_) => "validation",
            AppError::SessionError(_) => "session",
            AppError::InternalServerError(_) => "internal",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalServerError(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::ConnectivityError(format!("request timed out: {}", err))
        } else if err.is_connect() {
            AppError::ConnectivityError(format!("connection failed: {}", err))
        } else {
            AppError::ConnectivityError(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ConfigurationError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::ConnectivityError(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::SchemaError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::IdentityError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::CredentialError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::PolicyError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::SessionError(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
