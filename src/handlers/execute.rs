//! Materialized interface invocation.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn query_map(query: HashMap<String, String>) -> Map<String, Value> {
    query.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}

pub async fn execute_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.engine.execute(&id, &query_map(query)).await?;
    Ok(Json(result))
}

/// Body values win over query-string values of the same name.
pub async fn execute_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, AppError> {
    let mut params = query_map(query);
    match body.map(|Json(v)| v) {
        Some(Value::Object(m)) => params.extend(m),
        Some(Value::Null) | None => {}
        Some(_) => return Err(AppError::BadRequest("body must be a JSON object".into())),
    }
    let result = state.engine.execute(&id, &params).await?;
    Ok(Json(result))
}
