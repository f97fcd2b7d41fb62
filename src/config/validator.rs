//! Structural validation of generation requests and parameter sets.

use crate::config::{GenerationRequest, ParameterDefinition};
use crate::error::ConfigError;
use crate::service::parse_rules;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern"))
}

pub fn is_identifier(s: &str) -> bool {
    identifier_re().is_match(s)
}

/// `table` or `schema.table`, each part an identifier.
pub fn is_table_name(s: &str) -> bool {
    match s.split_once('.') {
        Some((schema, table)) => is_identifier(schema) && is_identifier(table),
        None => is_identifier(s),
    }
}

pub fn validate_table_name(table_name: &str) -> Result<(), ConfigError> {
    if is_table_name(table_name) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("invalid table name: '{}'", table_name)))
    }
}

/// Names are identifiers and unique; every validation rule parses.
pub fn validate_parameters(params: &[ParameterDefinition]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for p in params {
        if !is_identifier(&p.name) {
            return Err(ConfigError::Validation(format!("invalid parameter name: '{}'", p.name)));
        }
        if !seen.insert(p.name.as_str()) {
            return Err(ConfigError::DuplicateParameter(p.name.clone()));
        }
        if let Some(rule) = p.validation_rule.as_deref() {
            parse_rules(rule).map_err(|message| ConfigError::InvalidRule {
                param: p.name.clone(),
                message,
            })?;
        }
    }
    Ok(())
}

pub fn validate_request(req: &GenerationRequest) -> Result<(), ConfigError> {
    if req.config.name.trim().is_empty() {
        return Err(ConfigError::Validation("interface name is required".into()));
    }
    validate_table_name(&req.table_name)?;
    if let Some(limit) = req.config.rate_limit {
        if limit <= 0 {
            return Err(ConfigError::Validation("rate limit must be positive".into()));
        }
    }
    if let Some(timeout) = req.config.timeout {
        if timeout <= 0 {
            return Err(ConfigError::Validation("timeout must be positive".into()));
        }
    }
    validate_parameters(&req.parameters)
}
