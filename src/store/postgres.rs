//! PostgreSQL persistence for interfaces and their parameters. Conditional writes are status-gated UPDATE/DELETE.

use crate::error::AppError;
use crate::model::{
    InterfaceDefinition, InterfaceStatus, ParameterDescriptor, StatusStatistics,
};
use crate::ports::InterfaceStore;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

const INTERFACE_COLUMNS: &str = "id, interface_name, interface_path, description, category_id, data_source_id, \
    table_name, request_method, status, version, sql_template, response_format, rate_limit, timeout_secs, \
    created_at, created_by, updated_at, updated_by, published_at, published_by, offline_at, offline_by, offline_reason";

const PARAMETER_COLUMNS: &str = "id, interface_id, param_name, param_type, param_location, required, \
    default_value, validation_rule, example, description, sort_order, injected";

#[derive(Clone)]
pub struct PgInterfaceStore {
    pool: PgPool,
    schema: String,
}

impl PgInterfaceStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgInterfaceStore {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table(&self, name: &str) -> String {
        format!("{}.{}", self.schema, name)
    }

    /// Create the schema, both tables and their indexes if missing.
    pub async fn ensure_tables(&self) -> Result<(), AppError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(&self.pool)
            .await?;

        let interfaces = self.table("interfaces");
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                interface_name TEXT NOT NULL,
                interface_path TEXT NOT NULL,
                description TEXT,
                category_id TEXT,
                data_source_id TEXT NOT NULL,
                table_name TEXT NOT NULL,
                request_method TEXT NOT NULL DEFAULT 'GET',
                status TEXT NOT NULL DEFAULT 'UNPUBLISHED',
                version TEXT NOT NULL DEFAULT '1.0',
                sql_template TEXT NOT NULL,
                response_format JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                rate_limit INTEGER,
                timeout_secs INTEGER,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                created_by TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_by TEXT NOT NULL,
                published_at TIMESTAMPTZ,
                published_by TEXT,
                offline_at TIMESTAMPTZ,
                offline_by TEXT,
                offline_reason TEXT
            )
            "#,
            interfaces
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS interfaces_name_uq ON {} (interface_name)",
            interfaces
        ))
        .execute(&self.pool)
        .await?;
        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS interfaces_published_path_uq ON {} (interface_path) WHERE status = 'PUBLISHED'",
            interfaces
        ))
        .execute(&self.pool)
        .await?;

        let params = self.table("interface_parameters");
        let params_ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                interface_id TEXT NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
                param_name TEXT NOT NULL,
                param_type TEXT NOT NULL,
                param_location TEXT NOT NULL DEFAULT 'query',
                required BOOLEAN NOT NULL DEFAULT FALSE,
                default_value TEXT,
                validation_rule TEXT,
                example TEXT,
                description TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                injected BOOLEAN NOT NULL DEFAULT FALSE,
                UNIQUE (interface_id, param_name)
            )
            "#,
            params, interfaces
        );
        sqlx::query(&params_ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_parameters(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        params: &[ParameterDescriptor],
    ) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            self.table("interface_parameters"),
            PARAMETER_COLUMNS
        );
        for p in params {
            sqlx::query(&sql)
                .bind(&p.id)
                .bind(&p.interface_id)
                .bind(&p.name)
                .bind(p.param_type.as_str())
                .bind(p.location.as_str())
                .bind(p.required)
                .bind(&p.default_value)
                .bind(&p.validation_rule)
                .bind(&p.example)
                .bind(&p.description)
                .bind(p.sort_order)
                .bind(p.injected)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

fn decode_err(msg: String) -> AppError {
    AppError::Db(sqlx::Error::Decode(msg.into()))
}

fn conflict_on_unique(e: sqlx::Error, what: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::StateConflict(format!("{} already in use", what)),
        _ => AppError::Db(e),
    }
}

fn interface_from_row(row: &PgRow) -> Result<InterfaceDefinition, AppError> {
    let method: String = row.try_get("request_method")?;
    let status: String = row.try_get("status")?;
    Ok(InterfaceDefinition {
        id: row.try_get("id")?,
        name: row.try_get("interface_name")?,
        path: row.try_get("interface_path")?,
        description: row.try_get("description")?,
        category_id: row.try_get("category_id")?,
        data_source_id: row.try_get("data_source_id")?,
        table_name: row.try_get("table_name")?,
        method: method.parse().map_err(decode_err)?,
        status: status.parse().map_err(decode_err)?,
        version: row.try_get("version")?,
        sql_template: row.try_get("sql_template")?,
        response_format: row.try_get("response_format")?,
        rate_limit: row.try_get("rate_limit")?,
        timeout: row.try_get("timeout_secs")?,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
        published_at: row.try_get("published_at")?,
        published_by: row.try_get("published_by")?,
        offline_at: row.try_get("offline_at")?,
        offline_by: row.try_get("offline_by")?,
        offline_reason: row.try_get("offline_reason")?,
    })
}

fn parameter_from_row(row: &PgRow) -> Result<ParameterDescriptor, AppError> {
    let param_type: String = row.try_get("param_type")?;
    let location: String = row.try_get("param_location")?;
    Ok(ParameterDescriptor {
        id: row.try_get("id")?,
        interface_id: row.try_get("interface_id")?,
        name: row.try_get("param_name")?,
        param_type: param_type.parse().map_err(decode_err)?,
        location: location.parse().map_err(decode_err)?,
        required: row.try_get("required")?,
        default_value: row.try_get("default_value")?,
        validation_rule: row.try_get("validation_rule")?,
        example: row.try_get("example")?,
        description: row.try_get("description")?,
        sort_order: row.try_get("sort_order")?,
        injected: row.try_get("injected")?,
    })
}

#[async_trait]
impl InterfaceStore for PgInterfaceStore {
    async fn insert(&self, r: &InterfaceDefinition, params: &[ParameterDescriptor]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
             $15, $16, $17, $18, $19, $20, $21, $22, $23)",
            self.table("interfaces"),
            INTERFACE_COLUMNS
        );
        tracing::debug!(sql = %sql, interface_id = %r.id, "insert interface");
        sqlx::query(&sql)
            .bind(&r.id)
            .bind(&r.name)
            .bind(&r.path)
            .bind(&r.description)
            .bind(&r.category_id)
            .bind(&r.data_source_id)
            .bind(&r.table_name)
            .bind(r.method.as_str())
            .bind(r.status.as_str())
            .bind(&r.version)
            .bind(&r.sql_template)
            .bind(&r.response_format)
            .bind(r.rate_limit)
            .bind(r.timeout)
            .bind(r.created_at)
            .bind(&r.created_by)
            .bind(r.updated_at)
            .bind(&r.updated_by)
            .bind(r.published_at)
            .bind(&r.published_by)
            .bind(r.offline_at)
            .bind(&r.offline_by)
            .bind(&r.offline_reason)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "interface name"))?;
        self.insert_parameters(&mut tx, params).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<InterfaceDefinition>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", INTERFACE_COLUMNS, self.table("interfaces"));
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(interface_from_row).transpose()
    }

    async fn parameters(&self, id: &str) -> Result<Vec<ParameterDescriptor>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE interface_id = $1 ORDER BY sort_order, param_name",
            PARAMETER_COLUMNS,
            self.table("interface_parameters")
        );
        let rows = sqlx::query(&sql).bind(id).fetch_all(&self.pool).await?;
        rows.iter().map(parameter_from_row).collect()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<InterfaceDefinition>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE interface_name = $1",
            INTERFACE_COLUMNS,
            self.table("interfaces")
        );
        let row = sqlx::query(&sql).bind(name).fetch_optional(&self.pool).await?;
        row.as_ref().map(interface_from_row).transpose()
    }

    async fn find_published_by_path(
        &self,
        path: &str,
        excluding_id: &str,
    ) -> Result<Option<InterfaceDefinition>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE interface_path = $1 AND status = 'PUBLISHED' AND id <> $2 LIMIT 1",
            INTERFACE_COLUMNS,
            self.table("interfaces")
        );
        let row = sqlx::query(&sql)
            .bind(path)
            .bind(excluding_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(interface_from_row).transpose()
    }

    async fn list(&self, status: Option<InterfaceStatus>) -> Result<Vec<InterfaceDefinition>, AppError> {
        let table = self.table("interfaces");
        let rows = match status {
            Some(s) => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE status = $1 ORDER BY created_at DESC, id",
                    INTERFACE_COLUMNS, table
                );
                sqlx::query(&sql).bind(s.as_str()).fetch_all(&self.pool).await?
            }
            None => {
                let sql = format!("SELECT {} FROM {} ORDER BY created_at DESC, id", INTERFACE_COLUMNS, table);
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };
        rows.iter().map(interface_from_row).collect()
    }

    async fn status_counts(&self) -> Result<StatusStatistics, AppError> {
        let sql = format!("SELECT status, COUNT(*) FROM {} GROUP BY status", self.table("interfaces"));
        let rows = sqlx::query_as::<_, (String, i64)>(&sql).fetch_all(&self.pool).await?;
        let mut stats = StatusStatistics::default();
        for (status, count) in rows {
            let count = count.max(0) as u64;
            stats.total_count += count;
            match status.parse::<InterfaceStatus>() {
                Ok(InterfaceStatus::Unpublished) => stats.unpublished_count += count,
                Ok(InterfaceStatus::Published) => stats.published_count += count,
                Ok(InterfaceStatus::Offline) => stats.offline_count += count,
                Err(e) => tracing::warn!("status statistics: {}", e),
            }
        }
        Ok(stats)
    }

    async fn update_lifecycle(&self, r: &InterfaceDefinition, expected: InterfaceStatus) -> Result<bool, AppError> {
        let sql = format!(
            "UPDATE {} SET status = $2, published_at = $3, published_by = $4, offline_at = $5, offline_by = $6, \
             offline_reason = $7, updated_at = $8, updated_by = $9 WHERE id = $1 AND status = $10",
            self.table("interfaces")
        );
        let done = sqlx::query(&sql)
            .bind(&r.id)
            .bind(r.status.as_str())
            .bind(r.published_at)
            .bind(&r.published_by)
            .bind(r.offline_at)
            .bind(&r.offline_by)
            .bind(&r.offline_reason)
            .bind(r.updated_at)
            .bind(&r.updated_by)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "published path"))?;
        Ok(done.rows_affected() == 1)
    }

    async fn update_config(&self, r: &InterfaceDefinition, expected: InterfaceStatus) -> Result<bool, AppError> {
        let sql = format!(
            "UPDATE {} SET interface_name = $2, description = $3, category_id = $4, rate_limit = $5, \
             timeout_secs = $6, updated_at = $7, updated_by = $8 WHERE id = $1 AND status = $9",
            self.table("interfaces")
        );
        let done = sqlx::query(&sql)
            .bind(&r.id)
            .bind(&r.name)
            .bind(&r.description)
            .bind(&r.category_id)
            .bind(r.rate_limit)
            .bind(r.timeout)
            .bind(r.updated_at)
            .bind(&r.updated_by)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "interface name"))?;
        Ok(done.rows_affected() == 1)
    }

    async fn replace_parameters(
        &self,
        r: &InterfaceDefinition,
        expected: InterfaceStatus,
        params: &[ParameterDescriptor],
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "UPDATE {} SET sql_template = $2, updated_at = $3, updated_by = $4 WHERE id = $1 AND status = $5",
            self.table("interfaces")
        );
        let done = sqlx::query(&sql)
            .bind(&r.id)
            .bind(&r.sql_template)
            .bind(r.updated_at)
            .bind(&r.updated_by)
            .bind(expected.as_str())
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }
        sqlx::query(&format!(
            "DELETE FROM {} WHERE interface_id = $1",
            self.table("interface_parameters")
        ))
        .bind(&r.id)
        .execute(&mut *tx)
        .await?;
        self.insert_parameters(&mut tx, params).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: &str, expected: InterfaceStatus) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND status = $2", self.table("interfaces"));
        let done = sqlx::query(&sql)
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() == 1)
    }
}
