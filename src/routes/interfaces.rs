//! Management, lifecycle, batch and execution routes.

use crate::handlers::{batch, datasources, execute, interfaces};
use crate::routes::common::common_routes_with_ready;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request bodies above this size are rejected before reaching a handler.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn interface_routes(state: AppState) -> Router {
    Router::new()
        .route("/interfaces", get(interfaces::list).post(interfaces::create))
        .route("/interfaces/preview", post(interfaces::preview))
        .route("/interfaces/statistics", get(interfaces::statistics))
        .route("/interfaces/standard-parameters", get(interfaces::standard_parameters))
        .route(
            "/interfaces/:id",
            get(interfaces::read).patch(interfaces::update).delete(interfaces::delete),
        )
        .route("/interfaces/:id/parameters", post(interfaces::replace_parameters).put(interfaces::replace_parameters))
        .route("/interfaces/:id/publish", post(interfaces::publish))
        .route("/interfaces/:id/offline", post(interfaces::offline))
        .route("/interfaces/:id/republish", post(interfaces::republish))
        .route("/interfaces/:id/copy", post(interfaces::copy))
        .route("/batch", post(batch::submit))
        .route("/batch/tasks/:task_id", get(batch::task).delete(batch::remove_task))
        .route("/datasources/:id/test", get(datasources::test_connection))
        .route("/datasources/:id/tables", get(datasources::tables))
        .route("/datasources/:id/tables/:table/columns", get(datasources::columns))
        .route("/datasources/:id/tables/:table/sample", get(datasources::sample))
        .with_state(state)
}

/// Materialized endpoints, mounted under the execute URI prefix.
pub fn execute_routes(state: AppState) -> Router {
    Router::new()
        .route("/:id", get(execute::execute_get).post(execute::execute_post))
        .with_state(state)
}

/// Full application: common routes at the root, management under `/api/v1`, execution under the configured prefix.
pub fn router(state: AppState) -> Router {
    let prefix = state.engine.settings().execute_uri_prefix.trim_end_matches('/').to_string();
    let prefix = if prefix.is_empty() { "/execute".to_string() } else { prefix };
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api/v1", interface_routes(state.clone()))
        .nest(&prefix, execute_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
}
