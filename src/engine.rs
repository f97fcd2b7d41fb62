//! `Engine`: the caller-facing surface over generation, lifecycle, execution and batch services.

use crate::config::{EngineSettings, GenerationRequest, InterfacePatch, ParameterDefinition};
use crate::error::AppError;
use crate::model::{InterfaceDefinition, InterfaceDetail, InterfaceStatus, StatusStatistics};
use crate::ports::{ColumnInfo, GatewayAdapter, InterfaceStore, QueryBackend, TableInfo};
use crate::service::{
    standard_parameters, BatchOrchestrator, BatchOutcome, BatchRequest, ExecutionResult, Executor, Generator,
    Lifecycle, PreviewResult, TaskRegistry, TaskSnapshot,
};
use crate::sql::SampleKind;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Result of a batch submission: the outcome when run inline, or a task id when run in the background.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum BatchSubmission {
    Completed(BatchOutcome),
    Queued {
        #[serde(rename = "taskId")]
        task_id: String,
    },
}

pub struct Engine {
    settings: EngineSettings,
    backend: Arc<dyn QueryBackend>,
    generator: Arc<Generator>,
    lifecycle: Arc<Lifecycle>,
    executor: Executor,
    batch: Arc<BatchOrchestrator>,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn InterfaceStore>,
        backend: Arc<dyn QueryBackend>,
        gateway: Arc<dyn GatewayAdapter>,
    ) -> Self {
        let lifecycle = Arc::new(Lifecycle::new(
            Arc::clone(&store),
            gateway,
            settings.execute_uri_prefix.clone(),
        ));
        let tasks = Arc::new(TaskRegistry::new(
            Duration::from_secs(settings.task_ttl_secs),
            settings.task_capacity,
        ));
        let generator = Arc::new(Generator::new(Arc::clone(&store), Arc::clone(&backend), settings.clone()));
        let batch = Arc::new(BatchOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&lifecycle),
            Arc::clone(&generator),
            tasks,
            settings.batch_workers,
            settings.batch_max_size,
        ));
        Engine {
            generator,
            executor: Executor::new(store, Arc::clone(&backend)),
            settings,
            backend,
            lifecycle,
            batch,
        }
    }

    /// Pin the date that `date:max:yesterday` rules compare against.
    pub fn with_validation_date(mut self, today: NaiveDate) -> Self {
        self.executor = self.executor.with_today(today);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn generate(&self, req: &GenerationRequest, actor: &str) -> Result<String, AppError> {
        self.generator.generate(req, actor).await
    }

    pub fn preview(&self, req: &GenerationRequest) -> Result<PreviewResult, AppError> {
        self.generator.preview(req)
    }

    pub fn standard_parameters(&self) -> Vec<ParameterDefinition> {
        standard_parameters()
    }

    pub async fn get_interface(&self, id: &str) -> Result<InterfaceDetail, AppError> {
        self.generator.get_interface(id).await
    }

    pub async fn list_interfaces(&self, status: Option<InterfaceStatus>) -> Result<Vec<InterfaceDefinition>, AppError> {
        self.generator.list_interfaces(status).await
    }

    pub async fn status_statistics(&self) -> Result<StatusStatistics, AppError> {
        self.generator.status_statistics().await
    }

    pub async fn update_config(
        &self,
        id: &str,
        patch: &InterfacePatch,
        actor: &str,
    ) -> Result<InterfaceDefinition, AppError> {
        self.generator.update_config(id, patch, actor).await
    }

    pub async fn update_parameters(
        &self,
        id: &str,
        defs: &[ParameterDefinition],
        actor: &str,
    ) -> Result<InterfaceDetail, AppError> {
        self.generator.update_parameters(id, defs, actor).await
    }

    pub async fn copy_interface(&self, source_id: &str, new_name: &str, actor: &str) -> Result<String, AppError> {
        self.generator.copy_interface(source_id, new_name, actor).await
    }

    pub async fn publish(&self, id: &str, actor: &str) -> Result<InterfaceDefinition, AppError> {
        self.lifecycle.publish(id, actor).await
    }

    pub async fn offline(&self, id: &str, actor: &str, reason: &str) -> Result<InterfaceDefinition, AppError> {
        self.lifecycle.offline(id, actor, reason).await
    }

    pub async fn republish(&self, id: &str, actor: &str) -> Result<InterfaceDefinition, AppError> {
        self.lifecycle.republish(id, actor).await
    }

    pub async fn delete_interface(&self, id: &str, actor: &str) -> Result<(), AppError> {
        self.lifecycle.delete(id, actor).await
    }

    pub async fn execute(&self, interface_id: &str, params: &Map<String, Value>) -> Result<ExecutionResult, AppError> {
        self.executor.execute(interface_id, params).await
    }

    pub async fn batch(&self, req: &BatchRequest, actor: &str) -> Result<BatchOutcome, AppError> {
        self.batch.run(req, actor).await
    }

    /// Run inline, or in the background when the request asks for it.
    pub async fn submit_batch(&self, req: BatchRequest, actor: &str) -> Result<BatchSubmission, AppError> {
        if req.run_async {
            let task_id = self.batch.submit(req, actor.to_string())?;
            Ok(BatchSubmission::Queued { task_id })
        } else {
            Ok(BatchSubmission::Completed(self.batch.run(&req, actor).await?))
        }
    }

    pub fn task(&self, task_id: &str) -> Option<TaskSnapshot> {
        self.batch.tasks().get(task_id)
    }

    pub fn remove_task(&self, task_id: &str) -> bool {
        self.batch.tasks().remove(task_id)
    }

    pub async fn tables(&self, data_source_id: &str) -> Result<Vec<TableInfo>, AppError> {
        self.backend.tables(data_source_id).await
    }

    pub async fn table_columns(&self, data_source_id: &str, table_name: &str) -> Result<Vec<ColumnInfo>, AppError> {
        crate::config::validate_table_name(table_name)?;
        self.backend.table_columns(data_source_id, table_name).await
    }

    pub async fn test_connection(&self, data_source_id: &str) -> bool {
        self.backend.test_connection(data_source_id).await
    }

    pub async fn sample_sql(&self, data_source_id: &str, table_name: &str, kind: SampleKind) -> Result<String, AppError> {
        self.generator.sample_sql(data_source_id, table_name, kind).await
    }
}
