//! Generate interfaces from a table and parameter list, preview them, and maintain their definitions.

use crate::config::{
    copy_parameters, new_id, resolve_parameters, validate_parameters, validate_request, EngineSettings,
    GenerationRequest, InterfacePatch, ParameterDefinition,
};
use crate::error::AppError;
use crate::model::{
    InterfaceDefinition, InterfaceDetail, InterfaceStatus, ParamLocation, ParamType, ParameterDescriptor,
    StatusStatistics,
};
use crate::ports::{InterfaceStore, QueryBackend};
use crate::service::path;
use crate::sql::{compile, sample, SampleKind};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const INITIAL_VERSION: &str = "1.0";

/// What `generate` would create, without persisting anything.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub path: String,
    pub sql_template: String,
    pub sample_params: Map<String, Value>,
    pub response_format: Value,
}

pub fn response_format_template() -> Value {
    json!({
        "success": true,
        "data": [],
        "totalCount": 0,
        "executeSql": ""
    })
}

/// Platform parameters every interface is expected to accept. `appId` is injected and never filtered on.
pub fn standard_parameters() -> Vec<ParameterDefinition> {
    vec![
        ParameterDefinition {
            name: "dataTime".into(),
            param_type: ParamType::String,
            location: ParamLocation::Body,
            required: true,
            default_value: None,
            validation_rule: Some("date:max:yesterday".into()),
            example: Some("2022-03-17".into()),
            description: Some("Business date, no later than yesterday".into()),
            injected: false,
        },
        ParameterDefinition {
            name: "appId".into(),
            param_type: ParamType::String,
            location: ParamLocation::Body,
            required: true,
            default_value: None,
            validation_rule: Some("length:15-20".into()),
            example: Some("KzoHypQZH4-F6qM63L".into()),
            description: Some("Calling application id".into()),
            injected: true,
        },
    ]
}

fn sample_params(params: &[ParameterDescriptor]) -> Map<String, Value> {
    params
        .iter()
        .map(|p| {
            let v = p
                .example
                .clone()
                .filter(|e| !e.is_empty())
                .or_else(|| p.default_value.clone())
                .map(Value::String)
                .unwrap_or_else(|| p.param_type.sample_value());
            (p.name.clone(), v)
        })
        .collect()
}

pub struct Generator {
    store: Arc<dyn InterfaceStore>,
    backend: Arc<dyn QueryBackend>,
    settings: EngineSettings,
}

impl Generator {
    pub fn new(store: Arc<dyn InterfaceStore>, backend: Arc<dyn QueryBackend>, settings: EngineSettings) -> Self {
        Generator {
            store,
            backend,
            settings,
        }
    }

    async fn load(&self, id: &str) -> Result<InterfaceDefinition, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("interface {}", id)))
    }

    async fn ensure_name_free(&self, name: &str, own_id: Option<&str>) -> Result<(), AppError> {
        match self.store.find_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != own_id => Err(AppError::StateConflict(format!(
                "interface name already in use: {}",
                name
            ))),
            _ => Ok(()),
        }
    }

    fn resolve_path(&self, req: &GenerationRequest) -> String {
        match req.config.path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(explicit) => path::normalize(explicit),
            None => path::generate(
                &self.settings.path_prefix,
                &self.settings.path_version,
                req.config.category_id.as_deref(),
                &req.table_name,
                &req.config.name,
            ),
        }
    }

    pub fn preview(&self, req: &GenerationRequest) -> Result<PreviewResult, AppError> {
        validate_request(req)?;
        let descriptors = resolve_parameters("", &req.parameters);
        Ok(PreviewResult {
            path: self.resolve_path(req),
            sql_template: compile(&req.table_name, &descriptors),
            sample_params: sample_params(&descriptors),
            response_format: response_format_template(),
        })
    }

    pub async fn generate(&self, req: &GenerationRequest, actor: &str) -> Result<String, AppError> {
        validate_request(req)?;
        let name = req.config.name.trim();
        self.ensure_name_free(name, None).await?;

        let id = new_id();
        let descriptors = resolve_parameters(&id, &req.parameters);
        let now = Utc::now();
        let record = InterfaceDefinition {
            id: id.clone(),
            name: name.to_string(),
            path: self.resolve_path(req),
            description: req.config.description.clone(),
            category_id: req.config.category_id.clone(),
            data_source_id: req
                .data_source_id
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| self.settings.default_data_source.clone()),
            table_name: req.table_name.clone(),
            method: req.config.method,
            status: InterfaceStatus::Unpublished,
            version: INITIAL_VERSION.into(),
            sql_template: compile(&req.table_name, &descriptors),
            response_format: response_format_template(),
            rate_limit: req.config.rate_limit,
            timeout: req.config.timeout,
            created_at: now,
            created_by: actor.to_string(),
            updated_at: now,
            updated_by: actor.to_string(),
            published_at: None,
            published_by: None,
            offline_at: None,
            offline_by: None,
            offline_reason: None,
        };
        self.store.insert(&record, &descriptors).await?;
        tracing::info!(interface_id = %id, actor = %actor, path = %record.path, table = %record.table_name, "interface generated");
        Ok(id)
    }

    pub async fn update_config(
        &self,
        id: &str,
        patch: &InterfacePatch,
        actor: &str,
    ) -> Result<InterfaceDefinition, AppError> {
        let mut record = self.load(id).await?;
        if record.is_published() && patch.touches_identity() {
            return Err(AppError::StateConflict(format!(
                "interface {} is published; name and category are frozen",
                id
            )));
        }
        if let Some(name) = &patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("interface name must not be empty".into()));
            }
            self.ensure_name_free(name, Some(id)).await?;
            record.name = name.to_string();
        }
        if let Some(category) = &patch.category_id {
            record.category_id = Some(category.clone()).filter(|c| !c.is_empty());
        }
        if let Some(description) = &patch.description {
            record.description = Some(description.clone());
        }
        if patch.rate_limit.is_some_and(|r| r <= 0) || patch.timeout.is_some_and(|t| t <= 0) {
            return Err(AppError::Validation("rate limit and timeout must be positive".into()));
        }
        if patch.rate_limit.is_some() {
            record.rate_limit = patch.rate_limit;
        }
        if patch.timeout.is_some() {
            record.timeout = patch.timeout;
        }
        record.touch(actor, Utc::now());
        if !self.store.update_config(&record, record.status).await? {
            return Err(AppError::StateConflict(format!("interface {} was modified concurrently", id)));
        }
        tracing::info!(interface_id = %id, actor = %actor, "interface config updated");
        Ok(record)
    }

    /// Replace the whole parameter set and recompile the template.
    pub async fn update_parameters(
        &self,
        id: &str,
        defs: &[ParameterDefinition],
        actor: &str,
    ) -> Result<InterfaceDetail, AppError> {
        validate_parameters(defs)?;
        let mut record = self.load(id).await?;
        if record.is_published() {
            return Err(AppError::StateConflict(format!(
                "interface {} is published; parameters cannot change",
                id
            )));
        }
        let descriptors = resolve_parameters(id, defs);
        record.sql_template = compile(&record.table_name, &descriptors);
        record.touch(actor, Utc::now());
        if !self
            .store
            .replace_parameters(&record, record.status, &descriptors)
            .await?
        {
            return Err(AppError::StateConflict(format!("interface {} was modified concurrently", id)));
        }
        tracing::info!(interface_id = %id, actor = %actor, count = descriptors.len(), "interface parameters replaced");
        Ok(InterfaceDetail {
            interface: record,
            parameters: descriptors,
        })
    }

    /// New UNPUBLISHED interface with the source's definition and parameters.
    pub async fn copy_interface(&self, source_id: &str, new_name: &str, actor: &str) -> Result<String, AppError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::Validation("new interface name is required".into()));
        }
        let source = self.load(source_id).await?;
        self.ensure_name_free(new_name, None).await?;
        let params = self.store.parameters(source_id).await?;

        let id = new_id();
        let now = Utc::now();
        let record = InterfaceDefinition {
            id: id.clone(),
            name: new_name.to_string(),
            path: format!("{}_copy", source.path),
            description: source.description.as_ref().map(|d| format!("{} (copy)", d)),
            status: InterfaceStatus::Unpublished,
            version: INITIAL_VERSION.into(),
            created_at: now,
            created_by: actor.to_string(),
            updated_at: now,
            updated_by: actor.to_string(),
            published_at: None,
            published_by: None,
            offline_at: None,
            offline_by: None,
            offline_reason: None,
            ..source
        };
        self.store.insert(&record, &copy_parameters(&id, &params)).await?;
        tracing::info!(interface_id = %id, source_id = %source_id, actor = %actor, "interface copied");
        Ok(id)
    }

    pub async fn get_interface(&self, id: &str) -> Result<InterfaceDetail, AppError> {
        let interface = self.load(id).await?;
        let parameters = self.store.parameters(id).await?;
        Ok(InterfaceDetail { interface, parameters })
    }

    pub async fn list_interfaces(&self, status: Option<InterfaceStatus>) -> Result<Vec<InterfaceDefinition>, AppError> {
        self.store.list(status).await
    }

    pub async fn status_statistics(&self) -> Result<StatusStatistics, AppError> {
        self.store.status_counts().await
    }

    pub async fn sample_sql(&self, data_source_id: &str, table_name: &str, kind: SampleKind) -> Result<String, AppError> {
        crate::config::validate_table_name(table_name)?;
        let columns = self.backend.table_columns(data_source_id, table_name).await?;
        if columns.is_empty() {
            return Err(AppError::Validation(format!(
                "table {} has no columns in data source {}",
                table_name, data_source_id
            )));
        }
        Ok(sample(table_name, &columns, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_parameters_exclude_app_id_from_filters() {
        let defs = standard_parameters();
        let descriptors = resolve_parameters("x", &defs);
        assert_eq!(compile("t_load", &descriptors), "SELECT * FROM t_load WHERE dataTime = {dataTime}");
        assert!(validate_parameters(&defs).is_ok());
    }

    #[test]
    fn sample_params_prefer_example_then_default() {
        let mut defs = standard_parameters();
        defs[0].example = None;
        defs[0].default_value = Some("2024-01-01".into());
        defs.push(ParameterDefinition {
            name: "limit".into(),
            param_type: ParamType::Integer,
            location: ParamLocation::Query,
            required: false,
            default_value: None,
            validation_rule: None,
            example: None,
            description: None,
            injected: false,
        });
        let samples = sample_params(&resolve_parameters("x", &defs));
        assert_eq!(samples["dataTime"], json!("2024-01-01"));
        assert_eq!(samples["appId"], json!("KzoHypQZH4-F6qM63L"));
        assert_eq!(samples["limit"], json!(0));
    }
}
