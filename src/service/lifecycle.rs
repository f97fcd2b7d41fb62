//! Lifecycle state machine: publish, offline, republish and delete, kept in step with the routing gateway.
//!
//! Every write is conditional on the status read at load time. Route registration happens before the
//! status write and is fatal on failure, so a PUBLISHED interface always has a route. Deregistration
//! happens after the OFFLINE write and is best-effort.

use crate::error::AppError;
use crate::model::{InterfaceDefinition, InterfaceStatus};
use crate::ports::{GatewayAdapter, InterfaceStore, RouteRegistration};
use chrono::Utc;
use std::sync::Arc;

pub struct Lifecycle {
    store: Arc<dyn InterfaceStore>,
    gateway: Arc<dyn GatewayAdapter>,
    execute_uri_prefix: String,
}

impl Lifecycle {
    pub fn new(
        store: Arc<dyn InterfaceStore>,
        gateway: Arc<dyn GatewayAdapter>,
        execute_uri_prefix: impl Into<String>,
    ) -> Self {
        Lifecycle {
            store,
            gateway,
            execute_uri_prefix: execute_uri_prefix.into(),
        }
    }

    async fn load(&self, id: &str) -> Result<InterfaceDefinition, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("interface {}", id)))
    }

    pub fn route_for(&self, record: &InterfaceDefinition) -> RouteRegistration {
        RouteRegistration {
            route_id: record.route_id(),
            path: record.path.clone(),
            method: record.method,
            target_uri: format!("{}/{}", self.execute_uri_prefix.trim_end_matches('/'), record.id),
            rate_limit: record.rate_limit,
            timeout: record.timeout,
        }
    }

    /// Publish from UNPUBLISHED or OFFLINE.
    pub async fn publish(&self, id: &str, actor: &str) -> Result<InterfaceDefinition, AppError> {
        let record = self.load(id).await?;
        if record.is_published() {
            return Err(AppError::StateConflict(format!("interface {} is already published", id)));
        }
        self.activate(record, actor).await
    }

    /// Republish is only legal from OFFLINE.
    pub async fn republish(&self, id: &str, actor: &str) -> Result<InterfaceDefinition, AppError> {
        let record = self.load(id).await?;
        if record.status != InterfaceStatus::Offline {
            return Err(AppError::StateConflict(format!(
                "only OFFLINE interfaces can be republished, {} is {}",
                id, record.status
            )));
        }
        self.activate(record, actor).await
    }

    pub async fn offline(&self, id: &str, actor: &str, reason: &str) -> Result<InterfaceDefinition, AppError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("offline reason is required".into()));
        }
        let mut record = self.load(id).await?;
        if !record.is_published() {
            return Err(AppError::StateConflict(format!(
                "only PUBLISHED interfaces can be taken offline, {} is {}",
                id, record.status
            )));
        }
        record.mark_offline(actor, reason, Utc::now());
        if !self.store.update_lifecycle(&record, InterfaceStatus::Published).await? {
            return Err(concurrent_change(id));
        }
        if let Err(e) = self.gateway.deregister_route(&record.route_id()).await {
            tracing::warn!(interface_id = %id, route_id = %record.route_id(), error = %e, "gateway deregistration failed; route left stale");
        }
        tracing::info!(interface_id = %id, actor = %actor, reason = %reason, "interface taken offline");
        Ok(record)
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), AppError> {
        let record = self.load(id).await?;
        if record.is_published() {
            return Err(AppError::StateConflict(format!(
                "interface {} is published; take it offline before deleting",
                id
            )));
        }
        if !self.store.delete(id, record.status).await? {
            return Err(concurrent_change(id));
        }
        tracing::info!(interface_id = %id, actor = %actor, "interface deleted");
        Ok(())
    }

    async fn activate(&self, mut record: InterfaceDefinition, actor: &str) -> Result<InterfaceDefinition, AppError> {
        check_publishable(&record)?;
        if let Some(other) = self.store.find_published_by_path(&record.path, &record.id).await? {
            return Err(AppError::StateConflict(format!(
                "path {} is already published by interface {}",
                record.path, other.id
            )));
        }
        let expected = record.status;
        let route = self.route_for(&record);
        self.gateway.register_route(&route).await.map_err(|e| {
            tracing::error!(interface_id = %record.id, route_id = %route.route_id, error = %e, "gateway registration failed");
            match e {
                AppError::ExternalSync(_) => e,
                other => AppError::ExternalSync(other.to_string()),
            }
        })?;

        record.mark_published(actor, Utc::now());
        match self.store.update_lifecycle(&record, expected).await {
            Ok(true) => {
                tracing::info!(interface_id = %record.id, actor = %actor, path = %record.path, from = %expected, "interface published");
                Ok(record)
            }
            Ok(false) => {
                self.undo_registration(&record.id, &route.route_id).await;
                Err(concurrent_change(&record.id))
            }
            Err(e) => {
                self.undo_registration(&record.id, &route.route_id).await;
                Err(e)
            }
        }
    }

    /// After a lost write, drop the route unless a concurrent writer left the interface PUBLISHED.
    async fn undo_registration(&self, id: &str, route_id: &str) {
        let still_published = matches!(self.store.get(id).await, Ok(Some(r)) if r.is_published());
        if still_published {
            return;
        }
        if let Err(e) = self.gateway.deregister_route(route_id).await {
            tracing::warn!(interface_id = %id, route_id = %route_id, error = %e, "failed to roll back gateway registration");
        }
    }
}

fn concurrent_change(id: &str) -> AppError {
    AppError::StateConflict(format!("interface {} was modified concurrently", id))
}

fn check_publishable(record: &InterfaceDefinition) -> Result<(), AppError> {
    let required = [
        ("name", record.name.as_str()),
        ("path", record.path.as_str()),
        ("data source", record.data_source_id.as_str()),
        ("table name", record.table_name.as_str()),
        ("sql template", record.sql_template.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("cannot publish: {} is required", field)));
        }
    }
    Ok(())
}
