//! HTTP API Server
//!
//! REST API for querying the host's identity facts. Every facts request runs
//! a fresh evaluation pass, so responses always reflect the current host; the
//! pass cache only deduplicates provider work within a single request.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::facts::{FactName, FactRegistry, FactValue};

/// Shared application state
pub struct AppState {
    /// Fact registry, immutable after startup
    pub registry: FactRegistry,
}

/// HTTP API server
pub struct HttpServer {
    config: ApiConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: ApiConfig, registry: FactRegistry) -> Self {
        let state = Arc::new(AppState { registry });
        Self { config, state }
    }

    /// Create the router
    fn create_router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/health", get(handle_health))
            .route("/facts", get(handle_facts))
            .route("/facts/:name", get(handle_fact))
            .route("/server-id", get(handle_server_id))
            .with_state(state)
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            tracing::info!("HTTP API disabled");
            return Ok(());
        }

        let app = Self::create_router(Arc::clone(&self.state));

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        tracing::info!("HTTP API listening on {}", self.config.bind_address);

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

// ============ Response Types ============

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// Single fact response
#[derive(Debug, Serialize)]
pub struct FactResponse {
    pub name: String,
    /// Typed value; `null` when undetectable
    pub value: Option<FactValue>,
    /// Classic string rendering; empty when undetectable
    pub rendered: String,
}

/// Server-id response
///
/// An undetectable identity is a defined answer (`null` id, empty
/// rendering), not an error.
#[derive(Debug, Serialize)]
pub struct ServerIdResponse {
    pub server_id: Option<u32>,
    pub rendered: String,
    pub mac: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============ Handlers ============

async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_facts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.registry.snapshot() {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => evaluation_error(e),
    }
}

async fn handle_fact(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let name: FactName = match name.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Unknown fact: {}", name),
                    code: "UNKNOWN_FACT".to_string(),
                }),
            )
                .into_response();
        }
    };

    match state.registry.evaluate().resolve(name) {
        Ok(resolution) => Json(FactResponse {
            name: name.to_string(),
            value: resolution.value().cloned(),
            rendered: resolution.render(),
        })
        .into_response(),
        Err(e) => evaluation_error(e),
    }
}

async fn handle_server_id(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // One pass for both facts, so the MAC provider runs once
    let mut eval = state.registry.evaluate();
    let mac = match eval.resolve(FactName::MacAddress) {
        Ok(resolution) => resolution,
        Err(e) => return evaluation_error(e),
    };
    let id = match eval.resolve(FactName::MysqlServerId) {
        Ok(resolution) => resolution,
        Err(e) => return evaluation_error(e),
    };

    let server_id = match id.value() {
        Some(FactValue::ServerId(id)) => Some(id.as_u32()),
        _ => None,
    };

    Json(ServerIdResponse {
        server_id,
        rendered: id.render(),
        mac: mac.as_mac().map(|m| m.to_string()),
    })
    .into_response()
}

fn evaluation_error(e: Error) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
            code: "EVALUATION_FAILED".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FixedMacProvider, ServerIdProvider};

    fn state_with_mac(mac: Option<&str>) -> Arc<AppState> {
        let mut registry = FactRegistry::new();
        registry.register(Box::new(FixedMacProvider::new(
            mac.map(|m| m.parse().unwrap()),
        )));
        registry.register(Box::new(ServerIdProvider));
        Arc::new(AppState { registry })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_server_id_endpoint_with_known_mac() {
        let state = state_with_mac(Some("3c:97:0e:69:fb:e1"));
        let response = handle_server_id(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["server_id"], serde_json::json!(241857808));
        assert_eq!(json["rendered"], serde_json::json!("241857808"));
        assert_eq!(json["mac"], serde_json::json!("3c:97:0e:69:fb:e1"));
    }

    #[tokio::test]
    async fn test_server_id_endpoint_undetectable_mac() {
        let state = state_with_mac(None);
        let response = handle_server_id(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["server_id"], serde_json::Value::Null);
        assert_eq!(json["rendered"], serde_json::json!(""));
        assert_eq!(json["mac"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_fact_endpoint_resolves_server_id() {
        let state = state_with_mac(Some("3c:97:0e:69:fb:e1"));
        let response = handle_fact(State(state), Path("mysql_server_id".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["name"], serde_json::json!("mysql_server_id"));
        assert_eq!(json["value"], serde_json::json!(241857808));
        assert_eq!(json["rendered"], serde_json::json!("241857808"));
    }

    #[tokio::test]
    async fn test_unknown_fact_is_404() {
        let state = state_with_mac(None);
        let response = handle_fact(State(state), Path("uptime".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["code"], serde_json::json!("UNKNOWN_FACT"));
    }

    #[tokio::test]
    async fn test_facts_endpoint_returns_snapshot() {
        let state = state_with_mac(Some("52:54:00:12:34:56"));
        let response = handle_facts(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(
            json["facts"]["macaddress"],
            serde_json::json!("52:54:00:12:34:56")
        );
        assert_eq!(json["facts"]["mysql_server_id"], serde_json::json!(1235199));
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let response = handle_health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["healthy"], serde_json::json!(true));
        assert_eq!(
            json["version"],
            serde_json::json!(env!("CARGO_PKG_VERSION"))
        );
    }
}
