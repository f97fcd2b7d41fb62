//! Interface definition and lifecycle handlers.

use crate::config::{GenerationRequest, InterfacePatch, ParameterDefinition};
use crate::error::AppError;
use crate::extractors::Actor;
use crate::handlers::parse_body;
use crate::model::InterfaceStatus;
use crate::response::{success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct OfflineBody {
    #[serde(default)]
    reason: String,
}

#[derive(Deserialize)]
struct CopyBody {
    name: String,
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let req: GenerationRequest = parse_body(body)?;
    let id = state.engine.generate(&req, actor.as_str()).await?;
    Ok(success_one(json!({ "id": id })))
}

pub async fn preview(State(state): State<AppState>, Json(body): Json<Value>) -> Result<impl IntoResponse, AppError> {
    let req: GenerationRequest = parse_body(body)?;
    Ok(success_one_ok(state.engine.preview(&req)?))
}

pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = q
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<InterfaceStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;
    Ok(success_many(state.engine.list_interfaces(status).await?))
}

pub async fn statistics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.engine.status_statistics().await?))
}

pub async fn standard_parameters(State(state): State<AppState>) -> impl IntoResponse {
    success_many(state.engine.standard_parameters())
}

pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.engine.get_interface(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let patch: InterfacePatch = parse_body(body)?;
    Ok(success_one_ok(state.engine.update_config(&id, &patch, actor.as_str()).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    state.engine.delete_interface(&id, actor.as_str()).await?;
    Ok(success_one_ok(json!({ "id": id, "deleted": true })))
}

pub async fn replace_parameters(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let defs: Vec<ParameterDefinition> = parse_body(body)?;
    Ok(success_one_ok(state.engine.update_parameters(&id, &defs, actor.as_str()).await?))
}

pub async fn publish(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.engine.publish(&id, actor.as_str()).await?))
}

pub async fn offline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let body: OfflineBody = parse_body(body)?;
    Ok(success_one_ok(state.engine.offline(&id, actor.as_str(), &body.reason).await?))
}

pub async fn republish(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.engine.republish(&id, actor.as_str()).await?))
}

pub async fn copy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: Actor,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let body: CopyBody = parse_body(body)?;
    let new_id = state.engine.copy_interface(&id, &body.name, actor.as_str()).await?;
    Ok(success_one(json!({ "id": new_id, "sourceId": id })))
}
