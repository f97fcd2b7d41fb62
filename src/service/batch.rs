//! Batch orchestration of lifecycle operations over many interfaces, with per-item outcomes.
//!
//! Items are independent: one item failing never rolls back another. Ids whose current status does not
//! admit the operation are reported as skipped with reason "ineligible state". Force mode only changes how
//! items are counted in the summary; every item keeps its real outcome. A batch copy reports the new ids as
//! its successes.

use crate::config::InterfacePatch;
use crate::error::AppError;
use crate::model::InterfaceStatus;
use crate::ports::InterfaceStore;
use crate::service::generation::Generator;
use crate::service::lifecycle::Lifecycle;
use crate::service::tasks::TaskRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const INELIGIBLE_STATE: &str = "ineligible state";
pub const NOT_FOUND: &str = "interface not found";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BatchOperation {
    Publish,
    Offline { reason: String },
    Republish,
    Delete,
    /// Copy `ids[i]` to a new interface named `new_names[i]`.
    #[serde(rename_all = "camelCase")]
    Copy { new_names: Vec<String> },
    #[serde(rename_all = "camelCase")]
    UpdateCategory { category_id: String },
}

impl BatchOperation {
    pub fn name(&self) -> &'static str {
        match self {
            BatchOperation::Publish => "publish",
            BatchOperation::Offline { .. } => "offline",
            BatchOperation::Republish => "republish",
            BatchOperation::Delete => "delete",
            BatchOperation::Copy { .. } => "copy",
            BatchOperation::UpdateCategory { .. } => "updateCategory",
        }
    }

    /// Whether an interface in `status` may undergo this operation.
    pub fn admits(&self, status: InterfaceStatus) -> bool {
        match self {
            BatchOperation::Publish => status != InterfaceStatus::Published,
            BatchOperation::Offline { .. } => status == InterfaceStatus::Published,
            BatchOperation::Republish => status == InterfaceStatus::Offline,
            BatchOperation::Delete => status != InterfaceStatus::Published,
            BatchOperation::Copy { .. } => true,
            BatchOperation::UpdateCategory { .. } => status != InterfaceStatus::Published,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub ids: Vec<String>,
    pub operation: BatchOperation,
    /// Count skipped and failed items as successes in the summary.
    #[serde(default)]
    pub force_mode: bool,
    /// Run in the background and return a task id.
    #[serde(default, rename = "async")]
    pub run_async: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "camelCase")]
pub enum Outcome {
    Succeeded,
    Skipped(String),
    Failed(String),
}

impl Outcome {
    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Succeeded => None,
            Outcome::Skipped(r) | Outcome::Failed(r) => Some(r),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub id: String,
    pub outcome: Outcome,
    /// Counted as a success only because of force mode.
    pub forced: bool,
    /// Id of the interface the item created, for copies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub id: String,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub operation: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub total_count: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub success_ids: Vec<String>,
    pub failed_items: Vec<FailedItem>,
    pub items: Vec<ItemOutcome>,
}

impl BatchOutcome {
    fn summarize(operation: &BatchOperation, actor: &str, items: Vec<ItemOutcome>) -> Self {
        let mut success_ids = Vec::new();
        let mut failed_items = Vec::new();
        for item in &items {
            match item.outcome.reason() {
                Some(reason) if !item.forced => failed_items.push(FailedItem {
                    id: item.id.clone(),
                    reason: reason.to_string(),
                }),
                _ => success_ids.push(item.created_id.clone().unwrap_or_else(|| item.id.clone())),
            }
        }
        BatchOutcome {
            operation: operation.name().to_string(),
            actor: actor.to_string(),
            timestamp: Utc::now(),
            total_count: items.len(),
            success_count: success_ids.len(),
            failed_count: failed_items.len(),
            success_ids,
            failed_items,
            items,
        }
    }
}

pub struct BatchOrchestrator {
    store: Arc<dyn InterfaceStore>,
    lifecycle: Arc<Lifecycle>,
    generator: Arc<Generator>,
    tasks: Arc<TaskRegistry>,
    workers: Arc<Semaphore>,
    max_size: usize,
}

impl BatchOrchestrator {
    pub fn new(
        store: Arc<dyn InterfaceStore>,
        lifecycle: Arc<Lifecycle>,
        generator: Arc<Generator>,
        tasks: Arc<TaskRegistry>,
        workers: usize,
        max_size: usize,
    ) -> Self {
        BatchOrchestrator {
            store,
            lifecycle,
            generator,
            tasks,
            workers: Arc::new(Semaphore::new(workers)),
            max_size,
        }
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn validate(&self, req: &BatchRequest) -> Result<(), AppError> {
        if req.ids.is_empty() {
            return Err(AppError::Validation("batch ids must not be empty".into()));
        }
        if req.ids.len() > self.max_size {
            return Err(AppError::Validation(format!(
                "batch of {} exceeds the limit of {}",
                req.ids.len(),
                self.max_size
            )));
        }
        let mut seen = HashSet::with_capacity(req.ids.len());
        for id in &req.ids {
            if !seen.insert(id.as_str()) {
                return Err(AppError::Validation(format!("duplicate interface id in batch: {}", id)));
            }
        }
        match &req.operation {
            BatchOperation::Offline { reason } if reason.trim().is_empty() => {
                Err(AppError::Validation("offline reason is required".into()))
            }
            BatchOperation::Copy { new_names } if new_names.len() != req.ids.len() => Err(AppError::Validation(format!(
                "batch copy needs one new name per id: {} ids, {} names",
                req.ids.len(),
                new_names.len()
            ))),
            BatchOperation::Copy { new_names } if new_names.iter().any(|n| n.trim().is_empty()) => {
                Err(AppError::Validation("new interface names must not be empty".into()))
            }
            BatchOperation::UpdateCategory { category_id } if category_id.trim().is_empty() => {
                Err(AppError::Validation("category id is required".into()))
            }
            _ => Ok(()),
        }
    }

    pub async fn run(&self, req: &BatchRequest, actor: &str) -> Result<BatchOutcome, AppError> {
        self.run_with_progress(req, actor, |_| {}).await
    }

    /// Run every item in order, reporting the number processed after each one.
    pub async fn run_with_progress<F>(&self, req: &BatchRequest, actor: &str, progress: F) -> Result<BatchOutcome, AppError>
    where
        F: Fn(usize) + Send + Sync,
    {
        self.validate(req)?;
        let mut items = Vec::with_capacity(req.ids.len());
        for (i, id) in req.ids.iter().enumerate() {
            let (outcome, created_id) = self.run_one(id, i, &req.operation, actor).await;
            if let Some(reason) = outcome.reason() {
                tracing::warn!(interface_id = %id, operation = req.operation.name(), reason = %reason, forced = req.force_mode, "batch item not applied");
            }
            let forced = req.force_mode && outcome != Outcome::Succeeded;
            items.push(ItemOutcome {
                id: id.clone(),
                outcome,
                forced,
                created_id,
            });
            progress(i + 1);
        }
        let summary = BatchOutcome::summarize(&req.operation, actor, items);
        tracing::info!(
            operation = req.operation.name(),
            actor = %actor,
            total = summary.total_count,
            succeeded = summary.success_count,
            failed = summary.failed_count,
            "batch finished"
        );
        Ok(summary)
    }

    /// Apply the operation to the item at `index`, returning its outcome and any interface it created.
    async fn run_one(&self, id: &str, index: usize, op: &BatchOperation, actor: &str) -> (Outcome, Option<String>) {
        match self.store.get(id).await {
            Ok(Some(record)) if op.admits(record.status) => {}
            Ok(Some(_)) => return (Outcome::Skipped(INELIGIBLE_STATE.into()), None),
            Ok(None) => return (Outcome::Skipped(NOT_FOUND.into()), None),
            Err(e) => return (Outcome::Failed(e.to_string()), None),
        }
        let result = match op {
            BatchOperation::Publish => self.lifecycle.publish(id, actor).await.map(|_| None),
            BatchOperation::Offline { reason } => self.lifecycle.offline(id, actor, reason).await.map(|_| None),
            BatchOperation::Republish => self.lifecycle.republish(id, actor).await.map(|_| None),
            BatchOperation::Delete => self.lifecycle.delete(id, actor).await.map(|_| None),
            BatchOperation::Copy { new_names } => match new_names.get(index) {
                Some(name) => self.generator.copy_interface(id, name, actor).await.map(Some),
                None => Err(AppError::Validation(format!("no new name for item {}", index))),
            },
            BatchOperation::UpdateCategory { category_id } => {
                let patch = InterfacePatch {
                    category_id: Some(category_id.clone()),
                    ..InterfacePatch::default()
                };
                self.generator.update_config(id, &patch, actor).await.map(|_| None)
            }
        };
        match result {
            Ok(created) => (Outcome::Succeeded, created),
            Err(e) => (Outcome::Failed(e.to_string()), None),
        }
    }

    /// Validate, register a task and run the batch on the worker pool. Returns the task id.
    pub fn submit(self: &Arc<Self>, req: BatchRequest, actor: String) -> Result<String, AppError> {
        self.validate(&req)?;
        let task_id = self.tasks.create(req.ids.len())?;
        let this = Arc::clone(self);
        let tid = task_id.clone();
        tokio::spawn(async move {
            let _permit = match Arc::clone(&this.workers).acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    this.tasks.fail(&tid, "batch worker pool closed");
                    return;
                }
            };
            let tasks = Arc::clone(&this.tasks);
            let progress_id = tid.clone();
            let result = this
                .run_with_progress(&req, &actor, move |n| tasks.progress(&progress_id, n))
                .await;
            match result {
                Ok(outcome) => this.tasks.complete(&tid, outcome),
                Err(e) => {
                    tracing::error!(task_id = %tid, error = %e, "batch task failed");
                    this.tasks.fail(&tid, e.to_string());
                }
            }
        });
        tracing::info!(task_id = %task_id, "batch task submitted");
        Ok(task_id)
    }
}
