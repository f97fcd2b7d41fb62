//! Registry of asynchronous batch tasks. Bounded, with TTL eviction of finished tasks.

use crate::error::AppError;
use crate::service::batch::BatchOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    pub processed: usize,
    pub total: usize,
    pub result: Option<BatchOutcome>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

struct TaskEntry {
    snapshot: TaskSnapshot,
    finished: Option<Instant>,
}

pub struct TaskRegistry {
    entries: Mutex<HashMap<String, TaskEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl TaskRegistry {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        TaskRegistry {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TaskEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop finished tasks older than the TTL. Running tasks are never evicted.
    fn evict_expired(&self, entries: &mut HashMap<String, TaskEntry>) {
        let ttl = self.ttl;
        entries.retain(|_, e| e.finished.map_or(true, |at| at.elapsed() < ttl));
    }

    /// Register a RUNNING task. When full, the oldest finished task makes room; a registry full of running tasks rejects.
    pub fn create(&self, total: usize) -> Result<String, AppError> {
        let mut entries = self.lock();
        self.evict_expired(&mut entries);
        if entries.len() >= self.capacity {
            let oldest_finished = entries
                .iter()
                .filter_map(|(id, e)| e.finished.map(|at| (id.clone(), at)))
                .min_by_key(|(_, at)| *at)
                .map(|(id, _)| id);
            match oldest_finished {
                Some(id) => {
                    entries.remove(&id);
                }
                None => {
                    return Err(AppError::Validation(format!(
                        "too many running batch tasks (limit {})",
                        self.capacity
                    )))
                }
            }
        }
        let task_id = Uuid::new_v4().simple().to_string();
        entries.insert(
            task_id.clone(),
            TaskEntry {
                snapshot: TaskSnapshot {
                    task_id: task_id.clone(),
                    status: TaskStatus::Running,
                    processed: 0,
                    total,
                    result: None,
                    error: None,
                    created_at: Utc::now(),
                    finished_at: None,
                },
                finished: None,
            },
        );
        Ok(task_id)
    }

    pub fn progress(&self, task_id: &str, processed: usize) {
        if let Some(e) = self.lock().get_mut(task_id) {
            e.snapshot.processed = processed;
        }
    }

    pub fn complete(&self, task_id: &str, outcome: BatchOutcome) {
        self.finish(task_id, |s| {
            s.status = TaskStatus::Completed;
            s.processed = s.total;
            s.result = Some(outcome);
        });
    }

    pub fn fail(&self, task_id: &str, error: impl Into<String>) {
        let error = error.into();
        self.finish(task_id, |s| {
            s.status = TaskStatus::Failed;
            s.error = Some(error);
        });
    }

    fn finish(&self, task_id: &str, apply: impl FnOnce(&mut TaskSnapshot)) {
        let mut entries = self.lock();
        if let Some(e) = entries.get_mut(task_id) {
            apply(&mut e.snapshot);
            e.snapshot.finished_at = Some(Utc::now());
            e.finished = Some(Instant::now());
        }
    }

    pub fn get(&self, task_id: &str) -> Option<TaskSnapshot> {
        let mut entries = self.lock();
        self.evict_expired(&mut entries);
        entries.get(task_id).map(|e| e.snapshot.clone())
    }

    /// Explicit cleanup. Returns whether the task existed.
    pub fn remove(&self, task_id: &str) -> bool {
        self.lock().remove(task_id).is_some()
    }

    pub fn len(&self) -> usize {
        let mut entries = self.lock();
        self.evict_expired(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
