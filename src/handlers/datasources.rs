//! Data-source metadata passthroughs.

use crate::error::AppError;
use crate::response::{success_many, success_one_ok};
use crate::sql::SampleKind;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleQuery {
    pub query_type: Option<String>,
}

pub async fn test_connection(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let connected = state.engine.test_connection(&id).await;
    success_one_ok(json!({ "dataSourceId": id, "connected": connected }))
}

pub async fn tables(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.engine.tables(&id).await?))
}

pub async fn columns(
    State(state): State<AppState>,
    Path((id, table)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.engine.table_columns(&id, &table).await?))
}

pub async fn sample(
    State(state): State<AppState>,
    Path((id, table)): Path<(String, String)>,
    Query(q): Query<SampleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let kind = SampleKind::parse(q.query_type.as_deref().unwrap_or("SELECT"));
    let sql = state.engine.sample_sql(&id, &table, kind).await?;
    Ok(success_one_ok(json!({ "sql": sql })))
}
