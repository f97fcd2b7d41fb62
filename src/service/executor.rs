//! Execute a published interface: validate runtime values, render the template, dispatch to the backend.

use crate::error::AppError;
use crate::ports::{InterfaceStore, QueryBackend};
use crate::service::ParameterValidator;
use crate::sql::render;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Successful execution. `execute_sql` always carries the rendered query.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub data: Vec<Value>,
    pub total_count: u64,
    pub elapsed_ms: u64,
    pub execute_sql: String,
}

pub struct Executor {
    store: Arc<dyn InterfaceStore>,
    backend: Arc<dyn QueryBackend>,
    /// Fixed "today" for date rules; the local date when unset.
    today: Option<NaiveDate>,
}

impl Executor {
    pub fn new(store: Arc<dyn InterfaceStore>, backend: Arc<dyn QueryBackend>) -> Self {
        Executor {
            store,
            backend,
            today: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn validator(&self) -> ParameterValidator {
        self.today.map(ParameterValidator::at).unwrap_or_default()
    }

    pub async fn execute(&self, interface_id: &str, runtime: &Map<String, Value>) -> Result<ExecutionResult, AppError> {
        let record = self
            .store
            .get(interface_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("interface {}", interface_id)))?;
        if !record.is_published() {
            return Err(AppError::StateConflict("interface not published".into()));
        }
        let params = self.store.parameters(interface_id).await?;
        let validated = self.validator().validate(&params, runtime)?;
        let rendered = render(&record.sql_template, validated);
        tracing::debug!(interface_id = %interface_id, sql = %rendered.sql, "rendered interface query");

        let timeout = record
            .timeout
            .filter(|t| *t > 0)
            .map(|t| Duration::from_secs(t as u64));
        match self
            .backend
            .execute_query(&record.data_source_id, &rendered, timeout)
            .await
        {
            Ok(out) => Ok(ExecutionResult {
                success: true,
                data: out.rows,
                total_count: out.total_count,
                elapsed_ms: out.elapsed_ms,
                execute_sql: rendered.sql,
            }),
            Err(e) => {
                let message = match e {
                    AppError::Execution { message, .. } => message,
                    other => other.to_string(),
                };
                tracing::error!(interface_id = %interface_id, sql = %rendered.sql, error = %message, "interface execution failed");
                Err(AppError::Execution {
                    message,
                    sql: rendered.sql,
                })
            }
        }
    }
}
