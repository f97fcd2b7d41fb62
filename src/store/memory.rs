//! In-process store with the same conditional-write semantics as the PostgreSQL store.

use crate::error::AppError;
use crate::model::{InterfaceDefinition, InterfaceStatus, ParameterDescriptor, StatusStatistics};
use crate::ports::InterfaceStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Entry {
    record: InterfaceDefinition,
    params: Vec<ParameterDescriptor>,
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InterfaceStore for MemoryStore {
    async fn insert(&self, record: &InterfaceDefinition, params: &[ParameterDescriptor]) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&record.id) {
            return Err(AppError::StateConflict(format!("interface {} already exists", record.id)));
        }
        if entries.values().any(|e| e.record.name == record.name) {
            return Err(AppError::StateConflict(format!("interface name already in use: {}", record.name)));
        }
        entries.insert(
            record.id.clone(),
            Entry {
                record: record.clone(),
                params: params.to_vec(),
            },
        );
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<InterfaceDefinition>, AppError> {
        Ok(self.entries.read().await.get(id).map(|e| e.record.clone()))
    }

    async fn parameters(&self, id: &str) -> Result<Vec<ParameterDescriptor>, AppError> {
        let entries = self.entries.read().await;
        let mut params = entries.get(id).map(|e| e.params.clone()).unwrap_or_default();
        params.sort_by_key(|p| p.sort_order);
        Ok(params)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<InterfaceDefinition>, AppError> {
        let entries = self.entries.read().await;
        Ok(entries.values().find(|e| e.record.name == name).map(|e| e.record.clone()))
    }

    async fn find_published_by_path(
        &self,
        path: &str,
        excluding_id: &str,
    ) -> Result<Option<InterfaceDefinition>, AppError> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .find(|e| e.record.is_published() && e.record.path == path && e.record.id != excluding_id)
            .map(|e| e.record.clone()))
    }

    async fn list(&self, status: Option<InterfaceStatus>) -> Result<Vec<InterfaceDefinition>, AppError> {
        let entries = self.entries.read().await;
        let mut out: Vec<InterfaceDefinition> = entries
            .values()
            .filter(|e| status.map_or(true, |s| e.record.status == s))
            .map(|e| e.record.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn status_counts(&self) -> Result<StatusStatistics, AppError> {
        let entries = self.entries.read().await;
        let mut stats = StatusStatistics::default();
        for e in entries.values() {
            stats.total_count += 1;
            match e.record.status {
                InterfaceStatus::Unpublished => stats.unpublished_count += 1,
                InterfaceStatus::Published => stats.published_count += 1,
                InterfaceStatus::Offline => stats.offline_count += 1,
            }
        }
        Ok(stats)
    }

    async fn update_lifecycle(&self, record: &InterfaceDefinition, expected: InterfaceStatus) -> Result<bool, AppError> {
        let mut entries = self.entries.write().await;
        if record.is_published()
            && entries
                .values()
                .any(|e| e.record.id != record.id && e.record.is_published() && e.record.path == record.path)
        {
            return Err(AppError::StateConflict(format!("path already published: {}", record.path)));
        }
        let Some(entry) = entries.get_mut(&record.id).filter(|e| e.record.status == expected) else {
            return Ok(false);
        };
        let stored = &mut entry.record;
        stored.status = record.status;
        stored.published_at = record.published_at;
        stored.published_by = record.published_by.clone();
        stored.offline_at = record.offline_at;
        stored.offline_by = record.offline_by.clone();
        stored.offline_reason = record.offline_reason.clone();
        stored.updated_at = record.updated_at;
        stored.updated_by = record.updated_by.clone();
        Ok(true)
    }

    async fn update_config(&self, record: &InterfaceDefinition, expected: InterfaceStatus) -> Result<bool, AppError> {
        let mut entries = self.entries.write().await;
        if entries
            .values()
            .any(|e| e.record.id != record.id && e.record.name == record.name)
        {
            return Err(AppError::StateConflict(format!("interface name already in use: {}", record.name)));
        }
        let Some(entry) = entries.get_mut(&record.id).filter(|e| e.record.status == expected) else {
            return Ok(false);
        };
        let stored = &mut entry.record;
        stored.name = record.name.clone();
        stored.description = record.description.clone();
        stored.category_id = record.category_id.clone();
        stored.rate_limit = record.rate_limit;
        stored.timeout = record.timeout;
        stored.updated_at = record.updated_at;
        stored.updated_by = record.updated_by.clone();
        Ok(true)
    }

    async fn replace_parameters(
        &self,
        record: &InterfaceDefinition,
        expected: InterfaceStatus,
        params: &[ParameterDescriptor],
    ) -> Result<bool, AppError> {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(&record.id).filter(|e| e.record.status == expected) else {
            return Ok(false);
        };
        entry.record.sql_template = record.sql_template.clone();
        entry.record.updated_at = record.updated_at;
        entry.record.updated_by = record.updated_by.clone();
        entry.params = params.to_vec();
        Ok(true)
    }

    async fn delete(&self, id: &str, expected: InterfaceStatus) -> Result<bool, AppError> {
        let mut entries = self.entries.write().await;
        match entries.get(id) {
            Some(e) if e.record.status == expected => {
                entries.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
