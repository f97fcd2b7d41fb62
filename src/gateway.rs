//! Gateway adapters: a remote routing gateway over HTTP, and an in-process route table.

use crate::error::AppError;
use crate::ports::{GatewayAdapter, RouteRegistration};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

const ROUTES_PATH: &str = "/api/v1/gateway/routes";

/// Remote gateway. A non-2xx status or a JSON body with `"success": false` is a sync failure.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::ExternalSync(format!("gateway client: {}", e)))?;
        Ok(HttpGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check(op: &str, response: Result<reqwest::Response, reqwest::Error>) -> Result<(), AppError> {
        let response = response.map_err(|e| AppError::ExternalSync(format!("{}: {}", op, e)))?;
        let status = response.status();
        verdict(op, status, response.text().await)
    }
}

/// Judge a gateway reply from its status and body.
fn verdict<E: std::fmt::Display>(op: &str, status: StatusCode, body: Result<String, E>) -> Result<(), AppError> {
    let body = body.map_err(|e| AppError::ExternalSync(format!("{}: gateway returned {}, body unreadable: {}", op, status, e)))?;
    if !status.is_success() {
        return Err(AppError::ExternalSync(format!("{}: gateway returned {} {}", op, status, body)));
    }
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        if json.get("success").and_then(|s| s.as_bool()) == Some(false) {
            let message = json
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("rejected by gateway");
            return Err(AppError::ExternalSync(format!("{}: {}", op, message)));
        }
    }
    Ok(())
}

#[async_trait]
impl GatewayAdapter for HttpGateway {
    async fn register_route(&self, route: &RouteRegistration) -> Result<(), AppError> {
        let url = format!("{}{}", self.base_url, ROUTES_PATH);
        tracing::debug!(route_id = %route.route_id, path = %route.path, "registering gateway route");
        let response = self.client.post(&url).json(route).send().await;
        Self::check("register route", response).await
    }

    async fn deregister_route(&self, route_id: &str) -> Result<(), AppError> {
        let url = format!("{}{}/{}", self.base_url, ROUTES_PATH, route_id);
        tracing::debug!(route_id = %route_id, "deregistering gateway route");
        let response = self.client.delete(&url).send().await;
        Self::check("deregister route", response).await
    }
}

/// In-process route table, used when no remote gateway is configured.
#[derive(Default)]
pub struct RouteTable {
    routes: RwLock<HashMap<String, RouteRegistration>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, route_id: &str) -> Option<RouteRegistration> {
        self.routes.read().await.get(route_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.routes.read().await.len()
    }
}

#[async_trait]
impl GatewayAdapter for RouteTable {
    async fn register_route(&self, route: &RouteRegistration) -> Result<(), AppError> {
        self.routes
            .write()
            .await
            .insert(route.route_id.clone(), route.clone());
        Ok(())
    }

    async fn deregister_route(&self, route_id: &str) -> Result<(), AppError> {
        match self.routes.write().await.remove(route_id) {
            Some(_) => Ok(()),
            None => Err(AppError::ExternalSync(format!("route {} is not registered", route_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;

    fn route(id: &str) -> RouteRegistration {
        RouteRegistration {
            route_id: format!("interface_{}", id),
            path: format!("/api/data/v1/general/t/{}", id),
            method: HttpMethod::Get,
            target_uri: format!("/api/v1/execute/{}", id),
            rate_limit: None,
            timeout: Some(30),
        }
    }

    #[tokio::test]
    async fn route_table_registers_and_forgets() {
        let table = RouteTable::new();
        table.register_route(&route("a")).await.unwrap();
        assert_eq!(table.len().await, 1);
        assert_eq!(
            table.get("interface_a").await.map(|r| r.target_uri),
            Some("/api/v1/execute/a".to_string())
        );
        table.deregister_route("interface_a").await.unwrap();
        assert!(table.deregister_route("interface_a").await.is_err());
    }

    #[test]
    fn unreadable_body_is_a_sync_failure() {
        let err = verdict("register route", StatusCode::OK, Err("connection reset")).unwrap_err();
        match err {
            AppError::ExternalSync(msg) => {
                assert!(msg.contains("body unreadable"), "{}", msg);
                assert!(msg.contains("connection reset"), "{}", msg);
            }
            other => panic!("expected a sync failure, got {:?}", other),
        }
    }

    #[test]
    fn verdict_reads_status_and_success_flag() {
        assert!(verdict::<String>("op", StatusCode::OK, Ok(String::new())).is_ok());
        assert!(verdict::<String>("op", StatusCode::OK, Ok(r#"{"success":true}"#.into())).is_ok());
        let rejected = verdict::<String>("op", StatusCode::OK, Ok(r#"{"success":false,"message":"dup"}"#.into()));
        assert!(matches!(rejected, Err(AppError::ExternalSync(m)) if m == "op: dup"));
        assert!(verdict::<String>("op", StatusCode::BAD_GATEWAY, Ok("down".into())).is_err());
    }

    #[test]
    fn registration_serializes_camel_case() {
        let v = serde_json::to_value(route("x")).unwrap();
        assert_eq!(v["routeId"], "interface_x");
        assert_eq!(v["targetUri"], "/api/v1/execute/x");
        assert_eq!(v["method"], "GET");
    }
}
