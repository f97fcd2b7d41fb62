//! Bind typed runtime values onto sqlx PostgreSQL queries.
//!
//! Text values are not bound. sqlx sends every parameter as typed binary data, so a `text` bind compared with
//! a `date` or numeric column fails with `operator does not exist`. Text goes into the executed SQL as an
//! untyped dollar-quoted literal instead, which PostgreSQL resolves against the column the same way it resolves
//! the quoted literal in the reported SQL.

use crate::model::TypedValue;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// Dollar-quoted literal with a tag that does not occur in `s`. No escape processing applies inside.
pub fn untyped_literal(s: &str) -> String {
    let mut tag = String::from("v");
    let mut n = 0;
    while s.contains(&format!("${}$", tag)) || s.ends_with(&format!("${}", tag)) {
        n += 1;
        tag = format!("v{}", n);
    }
    format!("${tag}${s}${tag}$")
}

/// Bind one value with its native PostgreSQL type.
pub fn bind_typed<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &TypedValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        TypedValue::Text(s) => query.bind(s.clone()),
        TypedValue::Integer(n) => query.bind(*n),
        TypedValue::Long(n) => query.bind(*n),
        TypedValue::Double(f) => query.bind(*f),
        TypedValue::Boolean(b) => query.bind(*b),
        TypedValue::Date(d) => query.bind(*d),
        TypedValue::Datetime(dt) => query.bind(*dt),
    }
}

/// Bind all values in placeholder order.
pub fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: &[TypedValue],
) -> Query<'q, Postgres, PgArguments> {
    for v in values {
        query = bind_typed(query, v);
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untyped_literal_picks_a_free_tag() {
        assert_eq!(untyped_literal("2024-06-01"), "$v$2024-06-01$v$");
        assert_eq!(untyped_literal("x' OR '1'='1"), "$v$x' OR '1'='1$v$");
        assert_eq!(untyped_literal("a$v$b"), "$v1$a$v$b$v1$");
        assert_eq!(untyped_literal("ends$v"), "$v1$ends$v$v1$");
    }
}
