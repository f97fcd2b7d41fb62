//! Batch submission and task tracking handlers.

use crate::engine::BatchSubmission;
use crate::error::AppError;
use crate::extractors::Actor;
use crate::handlers::parse_body;
use crate::response::{success_accepted, success_one_ok};
use crate::service::BatchRequest;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

pub async fn submit(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let req: BatchRequest = parse_body(body)?;
    Ok(match state.engine.submit_batch(req, actor.as_str()).await? {
        queued @ BatchSubmission::Queued { .. } => success_accepted(queued).into_response(),
        done @ BatchSubmission::Completed(_) => success_one_ok(done).into_response(),
    })
}

pub async fn task(State(state): State<AppState>, Path(task_id): Path<String>) -> Result<impl IntoResponse, AppError> {
    let snapshot = state
        .engine
        .task(&task_id)
        .ok_or_else(|| AppError::NotFound(format!("batch task {}", task_id)))?;
    Ok(success_one_ok(snapshot))
}

pub async fn remove_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.engine.remove_task(&task_id) {
        return Err(AppError::NotFound(format!("batch task {}", task_id)));
    }
    Ok(success_one_ok(json!({ "taskId": task_id, "deleted": true })))
}
