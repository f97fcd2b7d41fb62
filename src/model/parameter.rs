//! Parameter descriptors and the closed set of parameter types with their coercion and literal rendering.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Declared parameter type. Each variant owns its coercion (`coerce`) and its SQL literal form (`TypedValue::sql_literal`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    #[serde(alias = "int")]
    Integer,
    Long,
    #[serde(alias = "decimal")]
    Double,
    Boolean,
    Date,
    #[serde(alias = "date_time")]
    Datetime,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Long => "long",
            ParamType::Double => "double",
            ParamType::Boolean => "boolean",
            ParamType::Date => "date",
            ParamType::Datetime => "datetime",
        }
    }

    /// Parse a runtime value into this type. Strings are parsed; JSON numbers and booleans are accepted where they fit.
    /// Returns None on mismatch; the caller names the parameter.
    pub fn coerce(&self, raw: &Value) -> Option<TypedValue> {
        match self {
            ParamType::String => Some(TypedValue::Text(raw_text(raw))),
            ParamType::Integer => match raw {
                Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()).map(TypedValue::Integer),
                Value::String(s) => s.trim().parse::<i32>().ok().map(TypedValue::Integer),
                _ => None,
            },
            ParamType::Long => match raw {
                Value::Number(n) => n.as_i64().map(TypedValue::Long),
                Value::String(s) => s.trim().parse::<i64>().ok().map(TypedValue::Long),
                _ => None,
            },
            ParamType::Double => match raw {
                Value::Number(n) => n.as_f64().map(TypedValue::Double),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(TypedValue::Double),
                _ => None,
            },
            ParamType::Boolean => match raw {
                Value::Bool(b) => Some(TypedValue::Boolean(*b)),
                Value::String(s) if s.eq_ignore_ascii_case("true") => Some(TypedValue::Boolean(true)),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Some(TypedValue::Boolean(false)),
                _ => None,
            },
            ParamType::Date => raw
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
                .map(TypedValue::Date),
            ParamType::Datetime => raw
                .as_str()
                .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT).ok())
                .map(TypedValue::Datetime),
        }
    }

    /// Placeholder example used when a descriptor has neither example nor default.
    pub fn sample_value(&self) -> Value {
        match self {
            ParamType::String => Value::String("string".into()),
            ParamType::Integer | ParamType::Long => Value::from(0),
            ParamType::Double => Value::from(0.0),
            ParamType::Boolean => Value::Bool(false),
            ParamType::Date => Value::String("2024-01-01".into()),
            ParamType::Datetime => Value::String("2024-01-01 00:00:00".into()),
        }
    }
}

impl std::str::FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" => Ok(ParamType::String),
            "integer" | "int" => Ok(ParamType::Integer),
            "long" => Ok(ParamType::Long),
            "double" | "decimal" => Ok(ParamType::Double),
            "boolean" => Ok(ParamType::Boolean),
            "date" => Ok(ParamType::Date),
            "datetime" | "date_time" => Ok(ParamType::Datetime),
            other => Err(format!("unknown parameter type: {}", other)),
        }
    }
}

/// String form of a raw runtime value, as seen by validation rules.
pub fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A runtime value after coercion to its declared type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Text(String),
    Integer(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
}

impl TypedValue {
    /// Literal SQL form: text and temporal values quoted (embedded quotes doubled), numbers and booleans bare.
    pub fn sql_literal(&self) -> String {
        match self {
            TypedValue::Text(s) => quote_literal(s),
            TypedValue::Integer(n) => n.to_string(),
            TypedValue::Long(n) => n.to_string(),
            TypedValue::Double(f) => f.to_string(),
            TypedValue::Boolean(b) => b.to_string(),
            TypedValue::Date(d) => quote_literal(&d.format(DATE_FORMAT).to_string()),
            TypedValue::Datetime(d) => quote_literal(&d.format(DATETIME_FORMAT).to_string()),
        }
    }

    /// String representation used by validation rules.
    pub fn text(&self) -> String {
        match self {
            TypedValue::Text(s) => s.clone(),
            TypedValue::Integer(n) => n.to_string(),
            TypedValue::Long(n) => n.to_string(),
            TypedValue::Double(f) => f.to_string(),
            TypedValue::Boolean(b) => b.to_string(),
            TypedValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            TypedValue::Datetime(d) => d.format(DATETIME_FORMAT).to_string(),
        }
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Where the caller supplies the parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    #[default]
    Query,
    Body,
    Path,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Query => "query",
            ParamLocation::Body => "body",
            ParamLocation::Path => "path",
        }
    }
}

impl std::str::FromStr for ParamLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "query" => Ok(ParamLocation::Query),
            "body" => Ok(ParamLocation::Body),
            "path" => Ok(ParamLocation::Path),
            other => Err(format!("unknown parameter location: {}", other)),
        }
    }
}

/// One accepted input of an interface. Replaced as a set; never mutated while the owner is PUBLISHED.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub id: String,
    pub interface_id: String,
    pub name: String,
    pub param_type: ParamType,
    pub location: ParamLocation,
    pub required: bool,
    pub default_value: Option<String>,
    /// Comma-separated rule directives (`length:`, `range:`, `date:max:yesterday`, `regex:`).
    pub validation_rule: Option<String>,
    pub example: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
    /// Platform-injected (e.g. appId); never compiled into the WHERE clause.
    pub injected: bool,
}

impl ParameterDescriptor {
    /// Only query/body parameters that are not platform-injected become column predicates.
    pub fn is_filter(&self) -> bool {
        !self.injected && matches!(self.location, ParamLocation::Query | ParamLocation::Body)
    }
}
