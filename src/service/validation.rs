//! Runtime parameter validation: presence, type coercion and rule directives.

use crate::model::{raw_text, ParameterDescriptor, TypedValue, DATE_FORMAT};
use chrono::{Duration, Local, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Validated, type-coerced runtime values keyed by parameter name.
pub type ValidatedParams = HashMap<String, TypedValue>;

/// A validation failure naming the offending parameter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamViolation {
    #[error("required parameter missing: {name}")]
    Missing { name: String },
    #[error("parameter {name} has wrong type, expected {expected}")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("parameter {name} length must be {expected}")]
    Length { name: String, expected: String },
    #[error("parameter {name} must be numeric")]
    NotNumeric { name: String },
    #[error("parameter {name} must be between {min} and {max}")]
    Range { name: String, min: f64, max: f64 },
    #[error("parameter {name} must not be later than yesterday")]
    DateTooLate { name: String },
    #[error("parameter {name} does not match the required format")]
    Pattern { name: String },
    #[error("invalid validation rule for {name}: {message}")]
    InvalidRule { name: String, message: String },
}

impl ParamViolation {
    pub fn parameter(&self) -> &str {
        match self {
            ParamViolation::Missing { name }
            | ParamViolation::TypeMismatch { name, .. }
            | ParamViolation::Length { name, .. }
            | ParamViolation::NotNumeric { name }
            | ParamViolation::Range { name, .. }
            | ParamViolation::DateTooLate { name }
            | ParamViolation::Pattern { name }
            | ParamViolation::InvalidRule { name, .. } => name,
        }
    }
}

/// One directive of a validation-rule expression.
#[derive(Clone, Debug)]
pub enum Rule {
    Length { min: usize, max: usize },
    Range { min: f64, max: f64 },
    DateMaxYesterday,
    Regex(Regex),
}

/// Parse a comma-separated rule expression. `regex:` takes the remainder of the expression, commas included.
/// Unknown directives are ignored; malformed known directives are errors.
pub fn parse_rules(expr: &str) -> Result<Vec<Rule>, String> {
    let mut rules = Vec::new();
    let mut rest = expr;
    loop {
        let trimmed = rest.trim_start();
        if let Some(pattern) = trimmed.strip_prefix("regex:") {
            let re = Regex::new(&format!("^(?:{})$", pattern))
                .map_err(|e| format!("invalid regex '{}': {}", pattern, e))?;
            rules.push(Rule::Regex(re));
            break;
        }
        let (piece, tail) = match trimmed.find(',') {
            Some(i) => (&trimmed[..i], Some(&trimmed[i + 1..])),
            None => (trimmed, None),
        };
        if let Some(rule) = parse_directive(piece.trim())? {
            rules.push(rule);
        }
        match tail {
            Some(t) => rest = t,
            None => break,
        }
    }
    Ok(rules)
}

fn parse_directive(directive: &str) -> Result<Option<Rule>, String> {
    if let Some(spec) = directive.strip_prefix("length:") {
        let (min, max) = match split_bounds(spec) {
            Some((lo, hi)) => (parse_usize(lo)?, parse_usize(hi)?),
            None => {
                let n = parse_usize(spec)?;
                (n, n)
            }
        };
        if min > max {
            return Err(format!("length range {} is inverted", spec));
        }
        return Ok(Some(Rule::Length { min, max }));
    }
    if let Some(spec) = directive.strip_prefix("range:") {
        let (lo, hi) = split_bounds(spec).ok_or_else(|| format!("range '{}' must be MIN-MAX", spec))?;
        let min = parse_f64(lo)?;
        let max = parse_f64(hi)?;
        if min > max {
            return Err(format!("range {} is inverted", spec));
        }
        return Ok(Some(Rule::Range { min, max }));
    }
    if directive == "date:max:yesterday" {
        return Ok(Some(Rule::DateMaxYesterday));
    }
    Ok(None)
}

/// Split `MIN-MAX` on the first '-' that is not a leading sign.
fn split_bounds(spec: &str) -> Option<(&str, &str)> {
    let bytes = spec.as_bytes();
    (1..bytes.len())
        .find(|&i| bytes[i] == b'-' && (bytes[i - 1].is_ascii_digit() || bytes[i - 1] == b'.'))
        .map(|i| (&spec[..i], &spec[i + 1..]))
}

fn parse_usize(s: &str) -> Result<usize, String> {
    s.trim().parse().map_err(|_| format!("'{}' is not a length", s))
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.trim().parse().map_err(|_| format!("'{}' is not a number", s))
}

/// Validates runtime values against descriptors in declaration order, stopping at the first failure.
#[derive(Clone, Debug)]
pub struct ParameterValidator {
    today: NaiveDate,
}

impl Default for ParameterValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterValidator {
    pub fn new() -> Self {
        ParameterValidator {
            today: Local::now().date_naive(),
        }
    }

    /// Validator with a fixed notion of "today" for date rules.
    pub fn at(today: NaiveDate) -> Self {
        ParameterValidator { today }
    }

    pub fn validate(
        &self,
        params: &[ParameterDescriptor],
        values: &Map<String, Value>,
    ) -> Result<ValidatedParams, ParamViolation> {
        let mut out = HashMap::with_capacity(params.len());
        for param in params {
            let supplied = values.get(&param.name).filter(|v| !is_blank(v)).cloned();
            let defaulted = param
                .default_value
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(|d| Value::String(d.to_string()));
            let raw = match supplied.or(defaulted) {
                Some(v) => v,
                None if param.required => {
                    return Err(ParamViolation::Missing {
                        name: param.name.clone(),
                    })
                }
                None => continue,
            };
            let typed = param.param_type.coerce(&raw).ok_or_else(|| ParamViolation::TypeMismatch {
                name: param.name.clone(),
                expected: param.param_type.as_str(),
            })?;
            if let Some(expr) = param.validation_rule.as_deref().filter(|r| !r.trim().is_empty()) {
                self.apply_rules(&param.name, expr, &raw_text(&raw), &typed)?;
            }
            out.insert(param.name.clone(), typed);
        }
        Ok(out)
    }

    fn apply_rules(&self, name: &str, expr: &str, text: &str, typed: &TypedValue) -> Result<(), ParamViolation> {
        let rules = parse_rules(expr).map_err(|message| ParamViolation::InvalidRule {
            name: name.to_string(),
            message,
        })?;
        for rule in &rules {
            match rule {
                Rule::Length { min, max } => {
                    let len = text.chars().count();
                    if len < *min || len > *max {
                        let expected = if min == max {
                            min.to_string()
                        } else {
                            format!("between {} and {}", min, max)
                        };
                        return Err(ParamViolation::Length {
                            name: name.to_string(),
                            expected,
                        });
                    }
                }
                Rule::Range { min, max } => {
                    let n: f64 = text.trim().parse().map_err(|_| ParamViolation::NotNumeric {
                        name: name.to_string(),
                    })?;
                    if n < *min || n > *max {
                        return Err(ParamViolation::Range {
                            name: name.to_string(),
                            min: *min,
                            max: *max,
                        });
                    }
                }
                Rule::DateMaxYesterday => {
                    let date = date_component(typed, text).ok_or_else(|| ParamViolation::TypeMismatch {
                        name: name.to_string(),
                        expected: "date",
                    })?;
                    if date > self.today - Duration::days(1) {
                        return Err(ParamViolation::DateTooLate { name: name.to_string() });
                    }
                }
                Rule::Regex(re) => {
                    if !re.is_match(text) {
                        return Err(ParamViolation::Pattern { name: name.to_string() });
                    }
                }
            }
        }
        Ok(())
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn date_component(typed: &TypedValue, text: &str) -> Option<NaiveDate> {
    match typed {
        TypedValue::Date(d) => Some(*d),
        TypedValue::Datetime(dt) => Some(dt.date()),
        _ => text
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParamLocation, ParamType};
    use serde_json::json;

    fn descriptor(name: &str, param_type: ParamType, required: bool, rule: Option<&str>) -> ParameterDescriptor {
        ParameterDescriptor {
            id: format!("p-{}", name),
            interface_id: "i-1".into(),
            name: name.into(),
            param_type,
            location: ParamLocation::Query,
            required,
            default_value: None,
            validation_rule: rule.map(String::from),
            example: None,
            description: None,
            sort_order: 0,
            injected: false,
        }
    }

    fn values(v: serde_json::Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn missing_required_parameter_is_named() {
        let params = vec![
            descriptor("region", ParamType::String, false, None),
            descriptor("plant", ParamType::String, true, None),
        ];
        let err = ParameterValidator::at(today())
            .validate(&params, &values(json!({"region": "north"})))
            .unwrap_err();
        assert_eq!(err, ParamViolation::Missing { name: "plant".into() });
        assert_eq!(err.to_string(), "required parameter missing: plant");

        let err = ParameterValidator::at(today())
            .validate(&params, &values(json!({"plant": ""})))
            .unwrap_err();
        assert_eq!(err.parameter(), "plant");
    }

    #[test]
    fn optional_absent_parameters_are_skipped() {
        let params = vec![descriptor("limit", ParamType::Integer, false, None)];
        let out = ParameterValidator::at(today()).validate(&params, &Map::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn defaults_fill_absent_values() {
        let mut p = descriptor("limit", ParamType::Integer, true, Some("range:1-100"));
        p.default_value = Some("10".into());
        let out = ParameterValidator::at(today()).validate(&[p], &Map::new()).unwrap();
        assert_eq!(out.get("limit"), Some(&TypedValue::Integer(10)));
    }

    #[test]
    fn type_mismatch_names_expected_type() {
        let params = vec![descriptor("count", ParamType::Long, true, None)];
        let err = ParameterValidator::at(today())
            .validate(&params, &values(json!({"count": "many"})))
            .unwrap_err();
        assert_eq!(
            err,
            ParamViolation::TypeMismatch {
                name: "count".into(),
                expected: "long"
            }
        );
    }

    #[test]
    fn length_rules_exact_and_ranged() {
        let v = ParameterValidator::at(today());
        let exact = vec![descriptor("code", ParamType::String, true, Some("length:4"))];
        assert!(v.validate(&exact, &values(json!({"code": "abcd"}))).is_ok());
        assert!(matches!(
            v.validate(&exact, &values(json!({"code": "abc"}))),
            Err(ParamViolation::Length { .. })
        ));

        let ranged = vec![descriptor("appId", ParamType::String, true, Some("length:15-20"))];
        assert!(v.validate(&ranged, &values(json!({"appId": "KzoHypQZH4-F6qM63L"}))).is_ok());
        assert!(v.validate(&ranged, &values(json!({"appId": "short"}))).is_err());
    }

    #[test]
    fn range_rule_compares_as_double() {
        let v = ParameterValidator::at(today());
        let params = vec![descriptor("load", ParamType::Double, true, Some("range:0.5-10"))];
        assert!(v.validate(&params, &values(json!({"load": "10"}))).is_ok());
        assert!(v.validate(&params, &values(json!({"load": 0.5}))).is_ok());
        let err = v.validate(&params, &values(json!({"load": "10.01"}))).unwrap_err();
        assert!(matches!(err, ParamViolation::Range { .. }));

        let negative = vec![descriptor("delta", ParamType::Integer, true, Some("range:-5-5"))];
        assert!(v.validate(&negative, &values(json!({"delta": "-3"}))).is_ok());
        assert!(v.validate(&negative, &values(json!({"delta": "-6"}))).is_err());
    }

    #[test]
    fn date_rule_rejects_today_and_later() {
        let v = ParameterValidator::at(today());
        let params = vec![descriptor("dataTime", ParamType::String, true, Some("date:max:yesterday"))];
        assert!(v.validate(&params, &values(json!({"dataTime": "2024-06-14"}))).is_ok());
        let err = v.validate(&params, &values(json!({"dataTime": "2024-06-15"}))).unwrap_err();
        assert_eq!(err, ParamViolation::DateTooLate { name: "dataTime".into() });

        let dt = vec![descriptor("at", ParamType::Datetime, true, Some("date:max:yesterday"))];
        assert!(v.validate(&dt, &values(json!({"at": "2024-06-14 23:59:59"}))).is_ok());
        assert!(v.validate(&dt, &values(json!({"at": "2024-06-16 00:00:00"}))).is_err());
    }

    #[test]
    fn regex_must_match_fully_and_may_contain_commas() {
        let v = ParameterValidator::at(today());
        let params = vec![descriptor("unit", ParamType::String, true, Some("length:2-6,regex:[A-Z]{2,4}"))];
        assert!(v.validate(&params, &values(json!({"unit": "ABC"}))).is_ok());
        assert!(matches!(
            v.validate(&params, &values(json!({"unit": "ABC1"}))),
            Err(ParamViolation::Pattern { .. })
        ));
        assert!(matches!(
            v.validate(&params, &values(json!({"unit": "A"}))),
            Err(ParamViolation::Length { .. })
        ));
    }

    #[test]
    fn stops_at_first_failing_parameter() {
        let params = vec![
            descriptor("a", ParamType::Integer, true, None),
            descriptor("b", ParamType::Integer, true, None),
        ];
        let err = ParameterValidator::at(today())
            .validate(&params, &values(json!({"a": "x", "b": "y"})))
            .unwrap_err();
        assert_eq!(err.parameter(), "a");
    }

    #[test]
    fn rule_grammar_ignores_unknown_and_rejects_malformed() {
        assert_eq!(parse_rules("string,length:15-20").unwrap().len(), 1);
        assert_eq!(parse_rules("date:YYYY-MM-DD,max:yesterday").unwrap().len(), 0);
        assert!(parse_rules("length:abc").is_err());
        assert!(parse_rules("range:10-1").is_err());
        assert!(parse_rules("range:5").is_err());
        assert!(parse_rules("regex:(unclosed").is_err());
    }
}
