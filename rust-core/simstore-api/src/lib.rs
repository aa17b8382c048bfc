// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! SimStore HTTP API
//!
//! Serves the simulation import/export protocol over HTTP:
//!
//! | Method    | Path                        | Effect                              |
//! |-----------|-----------------------------|-------------------------------------|
//! | `GET`     | `/api/v2/simulation`        | export, `?urlPattern=` filters      |
//! | `PUT`     | `/api/v2/simulation`        | import, replacing what is stored    |
//! | `POST`    | `/api/v2/simulation`        | import, merging into what is stored |
//! | `DELETE`  | `/api/v2/simulation`        | clear, answers the empty document   |
//! | `OPTIONS` | `/api/v2/simulation`        | allowed methods                     |
//! | `GET`     | `/api/v2/simulation/schema` | schema descriptor                   |
//! | `GET`     | `/health`                   | liveness and record count           |

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use simstore_cache::{Cache, CacheError};
use simstore_simulation::{
    schema_descriptor, ImportMode, ImportOutcome, SimulationError, SimulationStore,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

pub mod auth;
pub mod config;

pub use auth::{auth_middleware, AuthState};
pub use config::{open_cache, ApiConfig, BackendConfig, ConfigError};

pub const SIMULATION_PATH: &str = "/api/v2/simulation";
pub const SCHEMA_PATH: &str = "/api/v2/simulation/schema";
pub const SIMULATION_ALLOW: &str = "OPTIONS, GET, PUT, POST, DELETE";
pub const SCHEMA_ALLOW: &str = "OPTIONS, GET";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SimulationError> for ApiError {
    fn from(e: SimulationError) -> Self {
        if e.is_client_error() {
            ApiError::BadRequest(e.to_string())
        } else {
            error!(error = %e, "simulation store failure");
            ApiError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Errors that stop the server from starting or shutting down cleanly.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub backend: String,
    pub records: usize,
}

/// Query string of an export.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "urlPattern")]
    pub url_pattern: Option<String>,
}

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SimulationStore<dyn Cache>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            store: Arc::new(SimulationStore::new(cache)),
            start_time: Instant::now(),
        }
    }
}

/// Build the API router
pub fn build_router(state: AppState, auth: AuthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            SIMULATION_PATH,
            get(export_handler)
                .put(import_override_handler)
                .post(import_merge_handler)
                .delete(delete_handler)
                .options(simulation_options_handler),
        )
        .route(SCHEMA_PATH, get(schema_handler).options(schema_options_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state)
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn allow_response(methods: &'static str) -> Response {
    let mut response = StatusCode::OK.into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(methods));
    response
}

/// Health check handler
#[instrument(skip(state))]
async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let cache = state.store.cache();
    let records = cache
        .records_count()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        backend: cache.name().to_string(),
        records,
    }))
}

#[instrument(skip(state))]
async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let body = state.store.export(query.url_pattern.as_deref()).await?;
    Ok(json_response(StatusCode::OK, body))
}

#[instrument(skip(state, body), fields(bytes = body.len()))]
async fn import_override_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    import(&state, &body, ImportMode::Override).await
}

#[instrument(skip(state, body), fields(bytes = body.len()))]
async fn import_merge_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    import(&state, &body, ImportMode::Merge).await
}

async fn import(state: &AppState, body: &[u8], mode: ImportMode) -> Result<Response, ApiError> {
    let outcome = state.store.import(body, mode).await?;
    let status = match outcome {
        ImportOutcome::Rejected(ref result) => {
            warn!(?mode, reason = ?result.fatal_error, "import rejected");
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::OK,
    };
    Ok(json_response(status, outcome.to_body()?))
}

#[instrument(skip(state))]
async fn delete_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    state.store.delete_simulation().await?;
    let body = state.store.export(None).await?;
    Ok(json_response(StatusCode::OK, body))
}

async fn simulation_options_handler() -> Response {
    allow_response(SIMULATION_ALLOW)
}

async fn schema_handler() -> Json<&'static serde_json::Value> {
    Json(schema_descriptor())
}

async fn schema_options_handler() -> Response {
    allow_response(SCHEMA_ALLOW)
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound("no such endpoint".to_string())
}

/// Start the API server and run until Ctrl+C.
pub async fn serve(config: ApiConfig) -> Result<(), ServerError> {
    let cache = open_cache(&config.backend)?;
    let auth = AuthState::new(config.auth_token.as_deref());
    let state = AppState::new(Arc::clone(&cache));

    let addr = config.bind_addr();
    info!(
        %addr,
        backend = cache.name(),
        auth = auth.is_enabled(),
        "Starting SimStore API server"
    );

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, build_router(state, auth))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache.flush().await?;
    info!("SimStore API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use simstore_cache::InMemoryCache;
    use simstore_simulation::{
        encode_document, FieldMatcher, GlobalActions, RequestMatcher, ResponseDetails,
        SimulationDocument, SimulationPair,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(
            AppState::new(Arc::new(InMemoryCache::new())),
            AuthState::default(),
        )
    }

    fn document(paths: &[&str]) -> Vec<u8> {
        let pairs = paths
            .iter()
            .map(|p| {
                SimulationPair::new(
                    RequestMatcher::default()
                        .with_destination(FieldMatcher::exact("api.example.com"))
                        .with_path(FieldMatcher::exact(*p)),
                    ResponseDetails::new(200, format!("body of {p}")),
                )
            })
            .collect();
        encode_document(&SimulationDocument::new(pairs, GlobalActions::default())).unwrap()
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Vec<u8>,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, body) = call(&app(), Method::GET, "/health", vec![]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "in-memory");
        assert_eq!(body["records"], 0);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let app = app();
        let (status, body) =
            call(&app, Method::PUT, SIMULATION_PATH, document(&["/a", "/b"])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pairs"].as_array().unwrap().len(), 2);

        let (status, body) = call(&app, Method::GET, SIMULATION_PATH, vec![]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pairs"].as_array().unwrap().len(), 2);
        assert_eq!(body["meta"]["schemaVersion"], "v6");
    }

    #[tokio::test]
    async fn test_post_merges_and_put_replaces() {
        let app = app();
        call(&app, Method::PUT, SIMULATION_PATH, document(&["/a"])).await;

        let (_, body) = call(&app, Method::POST, SIMULATION_PATH, document(&["/b"])).await;
        assert_eq!(body["data"]["pairs"].as_array().unwrap().len(), 2);

        let (_, body) = call(&app, Method::PUT, SIMULATION_PATH, document(&["/c"])).await;
        let pairs = body["data"]["pairs"].as_array().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0]["request"]["path"][0]["value"], "/c");
    }

    #[tokio::test]
    async fn test_url_pattern_filter() {
        let app = app();
        call(&app, Method::PUT, SIMULATION_PATH, document(&["/a", "/b", "/a/c"])).await;

        let (status, body) = call(
            &app,
            Method::GET,
            "/api/v2/simulation?urlPattern=api.example.com/a",
            vec![],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pairs"].as_array().unwrap().len(), 2);

        let (_, health) = call(&app, Method::GET, "/health", vec![]).await;
        assert_eq!(health["records"], 3);
    }

    #[tokio::test]
    async fn test_invalid_url_pattern_is_bad_request() {
        let (status, body) = call(
            &app(),
            Method::GET,
            "/api/v2/simulation?urlPattern=%5B",
            vec![],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (status, body) =
            call(&app(), Method::PUT, SIMULATION_PATH, b"{not json".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("malformed simulation document"));
    }

    #[tokio::test]
    async fn test_unsupported_version_is_rejected() {
        let app = app();
        call(&app, Method::PUT, SIMULATION_PATH, document(&["/kept"])).await;

        let body = br#"{"data":{"pairs":[]},"meta":{"schemaVersion":"v99"}}"#.to_vec();
        let (status, result) = call(&app, Method::PUT, SIMULATION_PATH, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(result["fatalError"].is_string());

        let (_, health) = call(&app, Method::GET, "/health", vec![]).await;
        assert_eq!(health["records"], 1);
    }

    #[tokio::test]
    async fn test_partial_import_answers_with_warnings() {
        let body = serde_json::json!({
            "data": {
                "pairs": [
                    {"request": {"path": [{"matcher": "exact", "value": "/ok"}]},
                     "response": {"status": 200, "body": "ok"}},
                    {"request": {"path": [{"matcher": "telepathy", "value": "/bad"}]},
                     "response": {"status": 200, "body": "bad"}}
                ]
            },
            "meta": {"schemaVersion": "v6"}
        });
        let (status, result) = call(
            &app(),
            Method::PUT,
            SIMULATION_PATH,
            serde_json::to_vec(&body).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["accepted"], 1);
        assert_eq!(result["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_returns_empty_document() {
        let app = app();
        call(&app, Method::PUT, SIMULATION_PATH, document(&["/a"])).await;

        let (status, body) = call(&app, Method::DELETE, SIMULATION_PATH, vec![]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["pairs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_options_lists_methods() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(SIMULATION_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ALLOW], SIMULATION_ALLOW);
    }

    #[tokio::test]
    async fn test_schema_endpoint() {
        let (status, body) = call(&app(), Method::GET, SCHEMA_PATH, vec![]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["properties"]["data"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = call(&app(), Method::GET, "/api/v1/nope", vec![]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
    }
}
