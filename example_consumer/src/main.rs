//! Standalone interface engine server.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Configure through the environment or a `.env` file (see `EngineSettings`).

use interface_engine::{
    ensure_database_exists, router, AppState, DataSourceRegistry, Engine, EngineSettings, GatewayAdapter,
    HttpGateway, PgInterfaceStore, PgQueryBackend, RouteTable,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("interface_engine=info,tower_http=info")),
        )
        .init();

    let settings = EngineSettings::from_env()?;
    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;

    let store = PgInterfaceStore::new(pool.clone(), settings.schema.clone());
    store.ensure_tables().await?;

    let sources = settings.resolved_data_sources();
    let registry = DataSourceRegistry::from_urls(sources.iter().map(|(id, url)| (id.as_str(), url.as_str())))?;
    let gateway: Arc<dyn GatewayAdapter> = match settings.gateway_url.as_deref() {
        Some(url) => {
            tracing::info!(gateway = %url, "registering routes with remote gateway");
            Arc::new(HttpGateway::new(url)?)
        }
        None => {
            tracing::info!("no GATEWAY_URL set; using in-process route table");
            Arc::new(RouteTable::new())
        }
    };

    let listen_addr = settings.listen_addr.clone();
    let engine = Engine::new(settings, Arc::new(store), Arc::new(PgQueryBackend::new(registry)), gateway);
    let app = router(AppState::new(engine).with_pool(pool));

    let listener = TcpListener::bind(&listen_addr).await?;
    tracing::info!("interface engine listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
