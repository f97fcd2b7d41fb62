//! Extract the acting operator from the `X-Operator` header.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const OPERATOR_HEADER: &str = "X-Operator";

/// Used when the header is absent or blank.
pub const DEFAULT_ACTOR: &str = "system";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ACTOR.to_string());
        Ok(Actor(value))
    }
}
