//! Engine settings from the environment (a `.env` file is honoured).

use crate::config::validator::is_identifier;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub database_url: String,
    /// Schema holding the interface tables.
    pub schema: String,
    pub path_prefix: String,
    pub path_version: String,
    /// Gateway routes point at `{execute_uri_prefix}/{interface id}`.
    pub execute_uri_prefix: String,
    pub default_data_source: String,
    /// Extra data sources as (id, url). The default data source uses `database_url` unless listed.
    pub data_sources: Vec<(String, String)>,
    /// Remote gateway base URL; unset means the in-process route table.
    pub gateway_url: Option<String>,
    pub batch_max_size: usize,
    pub batch_workers: usize,
    pub task_ttl_secs: u64,
    pub task_capacity: usize,
    pub listen_addr: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            database_url: "postgres://localhost/interfaces".into(),
            schema: "interface_platform".into(),
            path_prefix: "/api/data".into(),
            path_version: "v1".into(),
            execute_uri_prefix: "/api/v1/execute".into(),
            default_data_source: "default".into(),
            data_sources: Vec::new(),
            gateway_url: None,
            batch_max_size: 100,
            batch_workers: 10,
            task_ttl_secs: 3600,
            task_capacity: 1000,
            listen_addr: "0.0.0.0:3000".into(),
        }
    }
}

impl EngineSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut s = EngineSettings::default();
        if let Some(v) = get("DATABASE_URL") {
            s.database_url = v;
        }
        if let Some(v) = get("INTERFACE_SCHEMA") {
            if !is_identifier(&v) {
                return Err(ConfigError::Load(format!("INTERFACE_SCHEMA is not an identifier: {}", v)));
            }
            s.schema = v;
        }
        if let Some(v) = get("INTERFACE_PATH_PREFIX") {
            s.path_prefix = v;
        }
        if let Some(v) = get("INTERFACE_PATH_VERSION") {
            s.path_version = v;
        }
        if let Some(v) = get("EXECUTE_URI_PREFIX") {
            s.execute_uri_prefix = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("DEFAULT_DATA_SOURCE") {
            s.default_data_source = v;
        }
        if let Some(v) = get("DATA_SOURCES") {
            s.data_sources = parse_data_sources(&v)?;
        }
        s.gateway_url = get("GATEWAY_URL");
        if let Some(v) = get("BATCH_MAX_SIZE") {
            s.batch_max_size = parse_num("BATCH_MAX_SIZE", &v)?;
        }
        if let Some(v) = get("BATCH_WORKERS") {
            s.batch_workers = parse_num("BATCH_WORKERS", &v)?;
        }
        if let Some(v) = get("TASK_TTL_SECS") {
            s.task_ttl_secs = parse_num("TASK_TTL_SECS", &v)?;
        }
        if let Some(v) = get("TASK_CAPACITY") {
            s.task_capacity = parse_num("TASK_CAPACITY", &v)?;
        }
        if let Some(v) = get("LISTEN_ADDR") {
            s.listen_addr = v;
        }
        if s.batch_max_size == 0 || s.batch_workers == 0 || s.task_capacity == 0 {
            return Err(ConfigError::Load(
                "BATCH_MAX_SIZE, BATCH_WORKERS and TASK_CAPACITY must be positive".into(),
            ));
        }
        Ok(s)
    }

    /// All data sources to register, with the default one falling back to `database_url`.
    pub fn resolved_data_sources(&self) -> Vec<(String, String)> {
        let mut out = self.data_sources.clone();
        if !out.iter().any(|(id, _)| id == &self.default_data_source) {
            out.push((self.default_data_source.clone(), self.database_url.clone()));
        }
        out
    }
}

fn parse_num<T: FromStr>(key: &str, v: &str) -> Result<T, ConfigError> {
    v.parse()
        .map_err(|_| ConfigError::Load(format!("{} must be a non-negative integer, got '{}'", key, v)))
}

/// `id=url;id=url`
fn parse_data_sources(v: &str) -> Result<Vec<(String, String)>, ConfigError> {
    v.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
                Ok((id.trim().to_string(), url.trim().to_string()))
            }
            _ => Err(ConfigError::Load(format!("DATA_SOURCES entry must be id=url: '{}'", entry))),
        })
        .collect()
}
