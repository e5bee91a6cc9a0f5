//! HTTP API: routing, shared state and error mapping.

pub mod chat;
pub mod contact;
pub mod facade;
pub mod group;
pub mod interface;
pub mod message;
pub mod rate_limit;
pub mod session;
pub mod status;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::error;

use wa_gateway_core::{Error, ServerConfig, SessionState};
use wa_gateway_session::ClientManager;

use self::rate_limit::RateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Session registry
    pub manager: ClientManager,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request fields
    #[error("{0}")]
    BadRequest(String),

    /// Too many requests from one client
    #[error("{0}")]
    TooManyRequests(String),

    /// Error reported by the session layer
    #[error(transparent)]
    Session(#[from] Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Session(e) => match e {
                Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                Error::SessionNotFound(_) | Error::QrNotAvailable(_) => StatusCode::NOT_FOUND,
                Error::SessionAlreadyExists(_) | Error::SessionNotReady { .. } => {
                    StatusCode::CONFLICT
                }
                Error::SessionLimitReached(_) => StatusCode::TOO_MANY_REQUESTS,
                Error::WaitTimeout(_) => StatusCode::REQUEST_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<SessionState>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let state = match &self {
            ApiError::Session(Error::SessionNotReady { state, .. }) => Some(*state),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.to_string(),
            state,
        };

        (status, Json(body)).into_response()
    }
}

/// Build the full application router.
pub fn router(manager: ClientManager, config: &ServerConfig) -> Router {
    let state = AppState { manager };

    let mut api = Router::new()
        .nest("/session", session::router())
        .nest("/message", message::router())
        .nest("/contact", contact::router())
        .nest("/chat", chat::router())
        .nest("/group", group::router())
        .nest("/status", status::router())
        .nest("/interface", interface::router());

    if config.rate_limit.enabled {
        let limiter = Arc::new(RateLimiter::new(
            Duration::from_secs(config.rate_limit.window_secs),
            config.rate_limit.max_requests,
        )
        .with_trust_proxy(config.rate_limit.trust_proxy));
        api = api.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit,
        ));
    }

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// GET / - service banner
async fn root() -> Json<Value> {
    Json(json!({
        "status": "online",
        "message": "WhatsApp Web API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "session": "/api/session",
            "message": "/api/message",
            "contact": "/api/contact",
            "chat": "/api/chat",
            "group": "/api/group",
            "status": "/api/status",
            "interface": "/api/interface",
        },
    }))
}

/// GET /health - liveness probe
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
}
