//! Interface engine: turns table-backed interface definitions into published, executable query endpoints.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod gateway;
pub mod handlers;
pub mod model;
pub mod ports;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use backend::{DataSourceRegistry, PgQueryBackend};
pub use config::{EngineSettings, GenerationRequest, InterfaceConfig, InterfacePatch, ParameterDefinition};
pub use engine::{BatchSubmission, Engine};
pub use error::{AppError, ConfigError};
pub use gateway::{HttpGateway, RouteTable};
pub use model::{InterfaceDefinition, InterfaceDetail, InterfaceStatus, ParameterDescriptor, StatusStatistics};
pub use ports::{GatewayAdapter, InterfaceStore, QueryBackend};
pub use response::{success_many, success_one};
pub use routes::{common_routes_with_ready, interface_routes, router};
pub use service::{BatchOperation, BatchOutcome, BatchRequest, ExecutionResult, Outcome};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgInterfaceStore};
