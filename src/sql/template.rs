//! SQL templates with `{name}` placeholders: compile from a table and its parameters, tokenize once, render.
//!
//! Rendering produces two forms of the same query. The literal form (values formatted per type, absent
//! values as `NULL`) is reported back to callers; the bound form (`$n` placeholders) is what gets executed.

use crate::model::{ParameterDescriptor, TypedValue};
use crate::service::ValidatedParams;
use crate::sql::params::untyped_literal;
use regex::Regex;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static placeholder pattern"))
}

/// `SELECT * FROM <table>` plus an equality predicate per filter parameter, in declaration order.
pub fn compile(table_name: &str, params: &[ParameterDescriptor]) -> String {
    let mut sql = format!("SELECT * FROM {}", table_name);
    let predicates: Vec<String> = params
        .iter()
        .filter(|p| p.is_filter())
        .map(|p| format!("{} = {{{}}}", p.name, p.name))
        .collect();
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    sql
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Placeholder(String),
}

/// A template split into literal text and placeholders, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

pub fn tokenize(template: &str) -> Template {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in placeholder_re().captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text(template[last..whole.start()].to_string()));
        }
        segments.push(Segment::Placeholder(name.as_str().to_string()));
        last = whole.end();
    }
    if last < template.len() {
        segments.push(Segment::Text(template[last..].to_string()));
    }
    Template { segments }
}

impl Template {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in order of appearance (repeats included).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Substitute formatted literals; placeholders without a value become `NULL`.
    pub fn render_literal(&self, values: &ValidatedParams) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Placeholder(name) => match values.get(name) {
                    None => out.push_str("NULL"),
                },
            }
        }
        out
    }

    /// Substitute `$n` for every typed placeholder, returning the binds in order. Text values are inlined as
    /// untyped literals.
    pub fn render_bound(&self, values: &ValidatedParams) -> (String, Vec<TypedValue>) {
        let mut out = String::new();
        let mut binds = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Placeholder(name) => match values.get(name) {
                    Some(TypedValue::Text(s)) => out.push_str(&untyped_literal(s)),
                    Some(v) => {
                        binds.push(v.clone());
                        out.push_str(&format!("${}", binds.len()));
                    }
                    None => out.push_str("NULL"),
                },
            }
        }
        (out, binds)
    }
}

/// A template rendered against validated values.
#[derive(Clone, Debug)]
pub struct RenderedQuery {
    /// Literal form, reported to callers.
    pub sql: String,
    /// Executed form with `$n` placeholders.
    pub bound_sql: String,
    pub binds: Vec<TypedValue>,
    pub params: ValidatedParams,
}

pub fn render(template: &str, params: ValidatedParams) -> RenderedQuery {
    let tokens = tokenize(template);
    let sql = tokens.render_literal(&params);
    let (bound_sql, binds) = tokens.render_bound(&params);
    RenderedQuery {
        sql,
        bound_sql,
        binds,
        params,
    }
}
