//! Collaborator contracts consumed by the engine: persistence, query backend, routing gateway.

use crate::error::AppError;
use crate::model::{
    HttpMethod, InterfaceDefinition, InterfaceStatus, ParameterDescriptor, StatusStatistics,
};
use crate::sql::RenderedQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Keyed persistence for interfaces and their parameter sets.
///
/// Every mutating method except `insert` is conditional: it applies only when the stored status still equals
/// `expected` and reports whether it did. A `false` return means another writer changed the status first.
#[async_trait]
pub trait InterfaceStore: Send + Sync {
    async fn insert(&self, record: &InterfaceDefinition, params: &[ParameterDescriptor]) -> Result<(), AppError>;

    async fn get(&self, id: &str) -> Result<Option<InterfaceDefinition>, AppError>;

    /// Parameters ordered by sort order.
    async fn parameters(&self, id: &str) -> Result<Vec<ParameterDescriptor>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<InterfaceDefinition>, AppError>;

    /// A PUBLISHED interface other than `excluding_id` holding `path`.
    async fn find_published_by_path(
        &self,
        path: &str,
        excluding_id: &str,
    ) -> Result<Option<InterfaceDefinition>, AppError>;

    /// Newest first.
    async fn list(&self, status: Option<InterfaceStatus>) -> Result<Vec<InterfaceDefinition>, AppError>;

    async fn status_counts(&self) -> Result<StatusStatistics, AppError>;

    /// Write status and publish/offline audit fields.
    async fn update_lifecycle(&self, record: &InterfaceDefinition, expected: InterfaceStatus) -> Result<bool, AppError>;

    /// Write name, description, category, rate limit and timeout.
    async fn update_config(&self, record: &InterfaceDefinition, expected: InterfaceStatus) -> Result<bool, AppError>;

    /// Replace the whole parameter set and write the record's SQL template.
    async fn replace_parameters(
        &self,
        record: &InterfaceDefinition,
        expected: InterfaceStatus,
        params: &[ParameterDescriptor],
    ) -> Result<bool, AppError>;

    /// Remove the record and its parameters.
    async fn delete(&self, id: &str, expected: InterfaceStatus) -> Result<bool, AppError>;
}

/// Column metadata of a backend table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub comment: Option<String>,
}

/// A table or view visible in a data source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub comment: Option<String>,
}

/// Tabular result of one executed query.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    pub rows: Vec<serde_json::Value>,
    pub total_count: u64,
    pub elapsed_ms: u64,
}

#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Run a rendered query. `timeout` is the interface's declared policy, enforced by the backend.
    async fn execute_query(
        &self,
        data_source_id: &str,
        query: &RenderedQuery,
        timeout: Option<Duration>,
    ) -> Result<QueryOutput, AppError>;

    /// User tables and views, ordered by schema and name.
    async fn tables(&self, data_source_id: &str) -> Result<Vec<TableInfo>, AppError>;

    async fn table_columns(&self, data_source_id: &str, table_name: &str) -> Result<Vec<ColumnInfo>, AppError>;

    async fn test_connection(&self, data_source_id: &str) -> bool;
}

/// Route registration sent to the gateway.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRegistration {
    pub route_id: String,
    pub path: String,
    pub method: HttpMethod,
    pub target_uri: String,
    pub rate_limit: Option<i32>,
    pub timeout: Option<i32>,
}

/// External routing gateway. Failures are `AppError::ExternalSync`; no retries happen at this seam.
#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    async fn register_route(&self, route: &RouteRegistration) -> Result<(), AppError>;

    async fn deregister_route(&self, route_id: &str) -> Result<(), AppError>;
}
