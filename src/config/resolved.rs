//! Resolve operator parameter definitions into persisted descriptors.

use crate::config::ParameterDefinition;
use crate::model::ParameterDescriptor;
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Descriptors for `interface_id`, sort order following declaration order (1-based).
pub fn resolve_parameters(interface_id: &str, defs: &[ParameterDefinition]) -> Vec<ParameterDescriptor> {
    defs.iter()
        .enumerate()
        .map(|(i, d)| ParameterDescriptor {
            id: new_id(),
            interface_id: interface_id.to_string(),
            name: d.name.clone(),
            param_type: d.param_type,
            location: d.location,
            required: d.required,
            default_value: d.default_value.clone().filter(|v| !v.is_empty()),
            validation_rule: d.validation_rule.clone().filter(|r| !r.trim().is_empty()),
            example: d.example.clone(),
            description: d.description.clone(),
            sort_order: i as i32 + 1,
            injected: d.injected,
        })
        .collect()
}

/// Copy a parameter set onto another interface with fresh ids.
pub fn copy_parameters(interface_id: &str, params: &[ParameterDescriptor]) -> Vec<ParameterDescriptor> {
    params
        .iter()
        .map(|p| ParameterDescriptor {
            id: new_id(),
            interface_id: interface_id.to_string(),
            ..p.clone()
        })
        .collect()
}
