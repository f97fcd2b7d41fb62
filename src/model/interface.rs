//! Persisted interface definition and its lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status. UNPUBLISHED is initial; deletion is only legal outside PUBLISHED.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterfaceStatus {
    Unpublished,
    Published,
    Offline,
}

impl InterfaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceStatus::Unpublished => "UNPUBLISHED",
            InterfaceStatus::Published => "PUBLISHED",
            InterfaceStatus::Offline => "OFFLINE",
        }
    }
}

impl std::fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InterfaceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UNPUBLISHED" => Ok(InterfaceStatus::Unpublished),
            "PUBLISHED" => Ok(InterfaceStatus::Published),
            "OFFLINE" => Ok(InterfaceStatus::Offline),
            other => Err(format!("unknown interface status: {}", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported request method: {}", other)),
        }
    }
}

/// A table-backed, parameterized query exposed as a governed endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDefinition {
    pub id: String,
    pub name: String,
    pub path: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub data_source_id: String,
    pub table_name: String,
    pub method: HttpMethod,
    pub status: InterfaceStatus,
    pub version: String,
    /// SQL with `{name}` placeholders.
    pub sql_template: String,
    pub response_format: serde_json::Value,
    /// Requests per minute.
    pub rate_limit: Option<i32>,
    /// Seconds.
    pub timeout: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
    pub published_at: Option<DateTime<Utc>>,
    pub published_by: Option<String>,
    pub offline_at: Option<DateTime<Utc>>,
    pub offline_by: Option<String>,
    pub offline_reason: Option<String>,
}

impl InterfaceDefinition {
    /// Gateway route id, derived from the interface id.
    pub fn route_id(&self) -> String {
        route_id_for(&self.id)
    }

    pub fn is_published(&self) -> bool {
        self.status == InterfaceStatus::Published
    }

    pub(crate) fn mark_published(&mut self, actor: &str, now: DateTime<Utc>) {
        self.status = InterfaceStatus::Published;
        self.published_at = Some(now);
        self.published_by = Some(actor.to_string());
        self.offline_at = None;
        self.offline_by = None;
        self.offline_reason = None;
        self.touch(actor, now);
    }

    pub(crate) fn mark_offline(&mut self, actor: &str, reason: &str, now: DateTime<Utc>) {
        self.status = InterfaceStatus::Offline;
        self.offline_at = Some(now);
        self.offline_by = Some(actor.to_string());
        self.offline_reason = Some(reason.to_string());
        self.touch(actor, now);
    }

    pub(crate) fn touch(&mut self, actor: &str, now: DateTime<Utc>) {
        self.updated_at = now;
        self.updated_by = actor.to_string();
    }
}

pub fn route_id_for(interface_id: &str) -> String {
    format!("interface_{}", interface_id)
}

/// Interface together with its parameter set, as returned by detail reads.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceDetail {
    #[serde(flatten)]
    pub interface: InterfaceDefinition,
    pub parameters: Vec<super::ParameterDescriptor>,
}

/// Interface counts per lifecycle status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusStatistics {
    pub total_count: u64,
    pub unpublished_count: u64,
    pub published_count: u64,
    pub offline_count: u64,
}
