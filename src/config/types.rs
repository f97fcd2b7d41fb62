//! Request-side definitions for generating and maintaining interfaces (serde).

use crate::model::{HttpMethod, ParamLocation, ParamType};
use serde::{Deserialize, Serialize};

/// One declared parameter, as supplied by an operator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(alias = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub location: ParamLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub validation_rule: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Platform-injected; accepted and validated but never filtered on.
    #[serde(default)]
    pub injected: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceConfig {
    pub name: String,
    /// Explicit request path; generated from category, table and name when absent.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub rate_limit: Option<i32>,
    #[serde(default)]
    pub timeout: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub table_name: String,
    /// Falls back to the configured default data source.
    #[serde(default)]
    pub data_source_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    pub config: InterfaceConfig,
}

/// Partial update of an interface's editable configuration. Absent fields are left as they are.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfacePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub rate_limit: Option<i32>,
    #[serde(default)]
    pub timeout: Option<i32>,
}

impl InterfacePatch {
    /// True when the patch touches fields frozen while PUBLISHED.
    pub fn touches_identity(&self) -> bool {
        self.name.is_some() || self.category_id.is_some()
    }
}
