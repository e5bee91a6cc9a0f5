//! Resource operations forwarded to a ready client.
//!
//! Each route is described by an [`Operation`]: the driver method it maps to
//! and the request fields it cannot do without. The request fields minus
//! `sessionId` become the call parameters.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    routing::{self, MethodRouter},
    Json,
};
use serde_json::{Map, Value};
use tracing::debug;

use wa_gateway_core::SessionId;

use super::{ApiError, AppState};

const SESSION_ID: &str = "sessionId";

/// One forwarded resource operation.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    call: &'static str,
    required: &'static [&'static str],
    arrays: &'static [&'static str],
    media: bool,
    missing: &'static str,
}

impl Operation {
    /// Operation forwarded as driver method `call`.
    pub fn new(call: &'static str) -> Self {
        Self {
            call,
            required: &[],
            arrays: &[],
            media: false,
            missing: "sessionId is required",
        }
    }

    /// Fields besides `sessionId` that must be present, and the message
    /// returned when any of them is missing.
    pub fn require(mut self, fields: &'static [&'static str], missing: &'static str) -> Self {
        self.required = fields;
        self.missing = missing;
        self
    }

    /// Required fields that must also be JSON arrays.
    pub fn arrays(mut self, fields: &'static [&'static str]) -> Self {
        self.arrays = fields;
        self
    }

    /// Require media content: base64 `data` or a `mediaUrl`.
    pub fn media(mut self) -> Self {
        self.media = true;
        self
    }

    /// Driver method name.
    pub fn call(&self) -> &'static str {
        self.call
    }

    /// Check the request fields and return the target session.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<SessionId, ApiError> {
        let missing = || ApiError::BadRequest(self.missing.to_string());

        let session_id = match params.get(SESSION_ID) {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return Err(missing()),
        };
        if !self.required.iter().all(|field| is_present(params.get(*field))) {
            return Err(missing());
        }
        if !self
            .arrays
            .iter()
            .all(|field| matches!(params.get(*field), Some(Value::Array(_))))
        {
            return Err(missing());
        }
        if self.media && !(is_present(params.get("data")) || is_present(params.get("mediaUrl"))) {
            return Err(ApiError::BadRequest(
                "data or mediaUrl is required".to_string(),
            ));
        }

        Ok(SessionId::parse(session_id.as_str())?)
    }

    /// Route taking its fields from a JSON body.
    pub fn post(self) -> MethodRouter<AppState> {
        routing::post(
            move |State(state): State<AppState>, Json(body): Json<Map<String, Value>>| async move {
                forward(&state, self, body).await
            },
        )
    }

    /// Route taking its fields from the path and query string.
    pub fn get(self) -> MethodRouter<AppState> {
        routing::get(
            move |State(state): State<AppState>,
                  Path(path): Path<HashMap<String, String>>,
                  Query(query): Query<HashMap<String, String>>| async move {
                let params = query
                    .into_iter()
                    .chain(path)
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect();
                forward(&state, self, params).await
            },
        )
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Validate `params`, then issue exactly one call on the session's client.
pub async fn forward(
    state: &AppState,
    operation: Operation,
    mut params: Map<String, Value>,
) -> Result<Json<Value>, ApiError> {
    let session_id = operation.validate(&params)?;
    params.remove(SESSION_ID);

    let client = state.manager.client(&session_id)?;
    debug!("Forwarding {} for session {}", operation.call, session_id);
    let result = client.call(operation.call, Value::Object(params)).await?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn error_message(result: Result<SessionId, ApiError>) -> String {
        match result {
            Err(ApiError::BadRequest(message)) => message,
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_session_id_always_required() {
        let op = Operation::new("interface.closeRightDrawer");
        assert_eq!(
            error_message(op.validate(&params(json!({})))),
            "sessionId is required"
        );
        assert_eq!(
            error_message(op.validate(&params(json!({"sessionId": ""})))),
            "sessionId is required"
        );
        assert_eq!(
            op.validate(&params(json!({"sessionId": "s1"}))).unwrap().as_str(),
            "s1"
        );
    }

    #[test]
    fn test_required_fields() {
        let op = Operation::new("chat.archive")
            .require(&["chatId"], "sessionId and chatId are required");

        assert_eq!(
            error_message(op.validate(&params(json!({"sessionId": "s1"})))),
            "sessionId and chatId are required"
        );
        assert_eq!(
            error_message(op.validate(&params(json!({"sessionId": "s1", "chatId": null})))),
            "sessionId and chatId are required"
        );
        assert!(op
            .validate(&params(json!({"sessionId": "s1", "chatId": "1@c.us"})))
            .is_ok());
    }

    #[test]
    fn test_zero_coordinates_are_present() {
        let op = Operation::new("message.sendLocation").require(
            &["chatId", "latitude", "longitude"],
            "sessionId, chatId, latitude, and longitude are required",
        );
        assert!(op
            .validate(&params(json!({
                "sessionId": "s1",
                "chatId": "1@c.us",
                "latitude": 0.0,
                "longitude": 0.0
            })))
            .is_ok());
    }

    #[test]
    fn test_array_fields() {
        let op = Operation::new("message.broadcast")
            .require(
                &["chatIds", "message"],
                "sessionId, chatIds (array), and message are required",
            )
            .arrays(&["chatIds"]);

        let result = op.validate(&params(json!({
            "sessionId": "s1",
            "chatIds": "1@c.us",
            "message": "hi"
        })));
        assert_eq!(
            error_message(result),
            "sessionId, chatIds (array), and message are required"
        );
    }

    #[test]
    fn test_media_required() {
        let op = Operation::new("status.media").media();
        assert_eq!(
            error_message(op.validate(&params(json!({"sessionId": "s1"})))),
            "data or mediaUrl is required"
        );
        assert!(op
            .validate(&params(json!({"sessionId": "s1", "mediaUrl": "https://x/y.png"})))
            .is_ok());
    }

    #[test]
    fn test_malformed_session_id() {
        let op = Operation::new("chat.list");
        let result = op.validate(&params(json!({"sessionId": "../etc"})));
        assert!(matches!(
            result,
            Err(ApiError::Session(wa_gateway_core::Error::InvalidInput(_)))
        ));
    }
}
