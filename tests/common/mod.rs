#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use interface_engine::config::{GenerationRequest, InterfaceConfig, ParameterDefinition};
use interface_engine::model::{ParamLocation, ParamType};
use interface_engine::ports::{ColumnInfo, GatewayAdapter, QueryBackend, QueryOutput, RouteRegistration, TableInfo};
use interface_engine::sql::RenderedQuery;
use interface_engine::{AppError, Engine, EngineSettings, MemoryStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Gateway that records live routes and can be switched into failure.
#[derive(Default)]
pub struct FakeGateway {
    pub fail: AtomicBool,
    routes: Mutex<HashMap<String, RouteRegistration>>,
    registrations: Mutex<usize>,
}

impl FakeGateway {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn has_route(&self, route_id: &str) -> bool {
        self.routes.lock().unwrap().contains_key(route_id)
    }

    pub fn route(&self, route_id: &str) -> Option<RouteRegistration> {
        self.routes.lock().unwrap().get(route_id).cloned()
    }

    pub fn registrations(&self) -> usize {
        *self.registrations.lock().unwrap()
    }
}

#[async_trait]
impl GatewayAdapter for FakeGateway {
    async fn register_route(&self, route: &RouteRegistration) -> Result<(), AppError> {
        // Yield so concurrent lifecycle calls interleave between load and write.
        tokio::task::yield_now().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::ExternalSync("gateway unavailable".into()));
        }
        *self.registrations.lock().unwrap() += 1;
        self.routes
            .lock()
            .unwrap()
            .insert(route.route_id.clone(), route.clone());
        Ok(())
    }

    async fn deregister_route(&self, route_id: &str) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::ExternalSync("gateway unavailable".into()));
        }
        self.routes.lock().unwrap().remove(route_id);
        Ok(())
    }
}

/// Backend over an always-empty table that records what it was asked to run.
#[derive(Default)]
pub struct StubBackend {
    pub fail_with: Mutex<Option<String>>,
    queries: Mutex<Vec<RenderedQuery>>,
}

impl StubBackend {
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn last_query(&self) -> Option<RenderedQuery> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl QueryBackend for StubBackend {
    async fn execute_query(
        &self,
        _data_source_id: &str,
        query: &RenderedQuery,
        _timeout: Option<Duration>,
    ) -> Result<QueryOutput, AppError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(AppError::Execution {
                message,
                sql: query.sql.clone(),
            });
        }
        Ok(QueryOutput::default())
    }

    async fn tables(&self, data_source_id: &str) -> Result<Vec<TableInfo>, AppError> {
        if data_source_id != "default" {
            return Err(AppError::NotFound(format!("data source {}", data_source_id)));
        }
        Ok(vec![TableInfo {
            schema: "public".into(),
            name: "t_orders".into(),
            comment: Some("orders".into()),
        }])
    }

    async fn table_columns(&self, _data_source_id: &str, _table_name: &str) -> Result<Vec<ColumnInfo>, AppError> {
        Ok(vec![ColumnInfo {
            name: "data_time".into(),
            data_type: "date".into(),
            nullable: false,
            comment: None,
        }])
    }

    async fn test_connection(&self, data_source_id: &str) -> bool {
        data_source_id == "default"
    }
}

pub struct Harness {
    pub engine: Engine,
    pub gateway: Arc<FakeGateway>,
    pub backend: Arc<StubBackend>,
}

pub fn validation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

pub fn harness() -> Harness {
    harness_with(EngineSettings::default())
}

pub fn harness_with(settings: EngineSettings) -> Harness {
    let gateway = Arc::new(FakeGateway::default());
    let backend = Arc::new(StubBackend::default());
    let engine = Engine::new(
        settings,
        Arc::new(MemoryStore::new()),
        Arc::clone(&backend) as Arc<dyn QueryBackend>,
        Arc::clone(&gateway) as Arc<dyn GatewayAdapter>,
    )
    .with_validation_date(validation_date());
    Harness {
        engine,
        gateway,
        backend,
    }
}

pub fn param(name: &str, param_type: ParamType, required: bool) -> ParameterDefinition {
    ParameterDefinition {
        name: name.into(),
        param_type,
        location: ParamLocation::Query,
        required,
        default_value: None,
        validation_rule: None,
        example: None,
        description: None,
        injected: false,
    }
}

pub fn request(name: &str, table: &str, parameters: Vec<ParameterDefinition>) -> GenerationRequest {
    GenerationRequest {
        table_name: table.into(),
        data_source_id: None,
        parameters,
        config: InterfaceConfig {
            name: name.into(),
            ..InterfaceConfig::default()
        },
    }
}

pub async fn generate(h: &Harness, name: &str) -> String {
    h.engine
        .generate(&request(name, "t_orders", vec![param("region", ParamType::String, false)]), "tester")
        .await
        .unwrap()
}

pub async fn published(h: &Harness, name: &str) -> String {
    let id = generate(h, name).await;
    h.engine.publish(&id, "tester").await.unwrap();
    id
}
