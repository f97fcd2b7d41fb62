//! PostgreSQL query backend: executes bound queries against registered data sources.

use crate::error::AppError;
use crate::ports::{ColumnInfo, QueryBackend, QueryOutput, TableInfo};
use crate::sql::{bind_all, RenderedQuery};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Data-source id to connection pool.
#[derive(Clone, Default)]
pub struct DataSourceRegistry {
    by_id: HashMap<String, PgPool>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        DataSourceRegistry {
            by_id: HashMap::new(),
        }
    }

    /// Register lazily-connecting pools; nothing is dialed until first use.
    pub fn from_urls<'a>(sources: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, AppError> {
        let mut registry = Self::new();
        for (id, url) in sources {
            let pool = PgPoolOptions::new().max_connections(5).connect_lazy(url)?;
            registry.by_id.insert(id.to_string(), pool);
        }
        Ok(registry)
    }

    pub fn with_pool(mut self, id: impl Into<String>, pool: PgPool) -> Self {
        self.by_id.insert(id.into(), pool);
        self
    }

    pub fn get(&self, id: &str) -> Option<&PgPool> {
        self.by_id.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

pub struct PgQueryBackend {
    sources: DataSourceRegistry,
}

impl PgQueryBackend {
    pub fn new(sources: DataSourceRegistry) -> Self {
        PgQueryBackend { sources }
    }

    fn pool(&self, data_source_id: &str) -> Result<&PgPool, AppError> {
        self.sources
            .get(data_source_id)
            .ok_or_else(|| AppError::NotFound(format!("data source {}", data_source_id)))
    }
}

/// Wrap a query so every row comes back as one JSON object, with PostgreSQL doing the type conversion.
fn as_json_rows(sql: &str) -> String {
    let inner = sql.trim().trim_end_matches(';');
    format!("SELECT row_to_json(q) AS row FROM ({}) AS q", inner)
}

#[async_trait]
impl QueryBackend for PgQueryBackend {
    async fn execute_query(
        &self,
        data_source_id: &str,
        query: &RenderedQuery,
        timeout: Option<Duration>,
    ) -> Result<QueryOutput, AppError> {
        let pool = self.pool(data_source_id)?;
        let wrapped = as_json_rows(&query.bound_sql);
        tracing::debug!(sql = %query.bound_sql, binds = ?query.binds, data_source = %data_source_id, "query");
        let started = Instant::now();
        let fetch = bind_all(sqlx::query(&wrapped), &query.binds).fetch_all(pool);
        let fetched = match timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| AppError::Execution {
                    message: format!("query timed out after {}s", limit.as_secs()),
                    sql: query.sql.clone(),
                })??,
            None => fetch.await?,
        };
        let rows = fetched
            .iter()
            .map(|r| r.try_get::<serde_json::Value, _>(0))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryOutput {
            total_count: rows.len() as u64,
            elapsed_ms: started.elapsed().as_millis() as u64,
            rows,
        })
    }

    async fn tables(&self, data_source_id: &str) -> Result<Vec<TableInfo>, AppError> {
        let pool = self.pool(data_source_id)?;
        let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
            r#"
            SELECT t.table_schema::text, t.table_name::text,
                   obj_description(format('%I.%I', t.table_schema, t.table_name)::regclass, 'pg_class')
            FROM information_schema.tables t
            WHERE t.table_schema NOT IN ('pg_catalog', 'information_schema')
              AND t.table_type IN ('BASE TABLE', 'VIEW')
            ORDER BY t.table_schema, t.table_name
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(schema, name, comment)| TableInfo { schema, name, comment })
            .collect())
    }

    async fn table_columns(&self, data_source_id: &str, table_name: &str) -> Result<Vec<ColumnInfo>, AppError> {
        let pool = self.pool(data_source_id)?;
        let (schema, table) = match table_name.split_once('.') {
            Some((s, t)) => (Some(s), t),
            None => (None, table_name),
        };
        let rows = sqlx::query_as::<_, (String, String, String, Option<String>)>(
            r#"
            SELECT c.column_name::text, c.data_type::text, c.is_nullable::text,
                   col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, c.ordinal_position)
            FROM information_schema.columns c
            WHERE c.table_schema::text = COALESCE($1::text, current_schema()) AND c.table_name::text = $2
            ORDER BY c.ordinal_position
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(name, data_type, nullable, comment)| ColumnInfo {
                name,
                data_type,
                nullable: nullable.eq_ignore_ascii_case("YES"),
                comment,
            })
            .collect())
    }

    async fn test_connection(&self, data_source_id: &str) -> bool {
        match self.pool(data_source_id) {
            Ok(pool) => sqlx::query("SELECT 1").fetch_optional(pool).await.is_ok(),
            Err(_) => false,
        }
    }
}
