//! Typed errors and HTTP mapping.

use crate::service::ParamViolation;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("invalid validation rule for {param}: {message}")]
    InvalidRule { param: String, message: String },
    #[error("duplicate parameter: {0}")]
    DuplicateParameter(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation: {0}")]
    Validation(String),
    #[error(transparent)]
    Parameter(#[from] ParamViolation),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("state conflict: {0}")]
    StateConflict(String),
    #[error("gateway sync: {0}")]
    ExternalSync(String),
    #[error("execution failed: {message}")]
    Execution { message: String, sql: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// True for every member of the validation family (request shape, parameter, config).
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::Parameter(_) | AppError::Config(_))
    }

    /// Rendered SQL attached to execution failures.
    pub fn rendered_sql(&self) -> Option<&str> {
        match self {
            AppError::Execution { sql, .. } => Some(sql.as_str()),
            _ => None,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::UNPROCESSABLE_ENTITY, "config_error"),
            AppError::Validation(_) | AppError::Parameter(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::StateConflict(_) => (StatusCode::CONFLICT, "state_conflict"),
            AppError::ExternalSync(_) => (StatusCode::BAD_GATEWAY, "external_sync_error"),
            AppError::Execution { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "execution_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let details = match &self {
            AppError::Execution { sql, .. } => Some(serde_json::json!({ "sql": sql })),
            AppError::Parameter(v) => Some(serde_json::json!({ "parameter": v.parameter() })),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
