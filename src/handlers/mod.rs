//! HTTP handlers for interface management, lifecycle, batch, execution and data-source metadata.

pub mod batch;
pub mod datasources;
pub mod execute;
pub mod interfaces;

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a JSON body, reporting shape errors as 400.
pub(crate) fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(format!("invalid request body: {}", e)))
}
