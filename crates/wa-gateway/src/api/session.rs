//! Session lifecycle endpoints under `/api/session`.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use wa_gateway_core::{Ack, SessionId, SessionInfo, SessionState};
use wa_gateway_session::{decode_data_url, CreateOptions};

use super::{ApiError, AppState};

/// Default wait for `GET /wait/:sessionId`.
const DEFAULT_WAIT_MS: u64 = 30_000;

/// Longest wait a caller may ask for.
const MAX_WAIT_MS: u64 = 300_000;

/// Session routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start))
        .route("/stop/:sessionId", post(stop))
        .route("/logout/:sessionId", post(logout))
        .route("/qr/:sessionId", get(qr))
        .route("/qr/:sessionId/image", get(qr_image))
        .route("/status/:sessionId", get(status))
        .route("/list", get(list))
        .route("/info/:sessionId", get(info))
        .route("/state/:sessionId", get(client_state))
        .route("/wait/:sessionId", get(wait))
}

/// Body of `POST /start`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Session to create
    pub session_id: Option<String>,
    /// Options forwarded to the client library
    #[serde(default)]
    pub options: Value,
    /// Destroy the session if it is not ready in time
    pub ready_timeout_ms: Option<u64>,
}

/// Pending QR code as returned to callers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrResponse {
    /// Raw challenge
    pub qr: String,
    /// PNG data URL
    pub qr_image: String,
}

/// Query of `GET /wait/:sessionId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitQuery {
    /// Milliseconds to wait
    pub timeout_ms: Option<u64>,
}

fn session_id(raw: &str) -> Result<SessionId, ApiError> {
    Ok(SessionId::parse(raw)?)
}

#[instrument(skip_all)]
async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<Ack>, ApiError> {
    let raw = request
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("sessionId is required".to_string()))?;

    let options = CreateOptions {
        overrides: request.options,
        ready_timeout: request.ready_timeout_ms.map(Duration::from_millis),
    };
    let ack = state.manager.create(session_id(&raw)?, options).await?;

    Ok(Json(ack))
}

#[instrument(skip_all)]
async fn stop(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    Ok(Json(state.manager.destroy(&session_id(&raw)?).await?))
}

#[instrument(skip_all)]
async fn logout(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    Ok(Json(state.manager.logout(&session_id(&raw)?).await?))
}

async fn qr(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<QrResponse>, ApiError> {
    let code = state.manager.qr_code(&session_id(&raw)?)?;
    Ok(Json(QrResponse {
        qr: code.challenge,
        qr_image: code.image,
    }))
}

async fn qr_image(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let code = state.manager.qr_code(&session_id(&raw)?)?;
    let png = decode_data_url(&code.image)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

async fn status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<SessionInfo>, ApiError> {
    Ok(Json(state.manager.session_state(&session_id(&raw)?)?))
}

async fn list(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "sessions": state.manager.all_sessions() }))
}

#[instrument(skip_all)]
async fn info(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = state.manager.client(&session_id(&raw)?)?;
    let info = client.call("session.info", json!({})).await?;
    Ok(Json(json!({ "info": info })))
}

#[instrument(skip_all)]
async fn client_state(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = state.manager.client(&session_id(&raw)?)?;
    let client_state = client.call("session.state", json!({})).await?;
    Ok(Json(json!({ "state": client_state })))
}

#[instrument(skip_all)]
async fn wait(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<Value>, ApiError> {
    let timeout = query.timeout_ms.unwrap_or(DEFAULT_WAIT_MS).min(MAX_WAIT_MS);
    let id = session_id(&raw)?;

    state
        .manager
        .wait_until_ready(&id, Duration::from_millis(timeout))
        .await?;

    Ok(Json(json!({
        "success": true,
        "sessionId": id,
        "state": SessionState::Ready,
    })))
}
