//! Lifecycle events emitted by a messaging client.

use serde_json::Value;

use crate::{Error, Result};

/// Lifecycle notification from the client library.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A pairing challenge must be scanned
    Qr {
        /// Raw challenge string
        qr: String,
    },
    /// Credentials were accepted
    Authenticated,
    /// Credentials were rejected
    AuthFailure {
        /// Reason reported by the library
        message: String,
    },
    /// Client finished loading and is usable
    Ready,
    /// Connection was lost
    Disconnected {
        /// Reason reported by the library
        reason: String,
    },
    /// Loading progress; observational only
    LoadingScreen {
        /// Completion percentage
        percent: u32,
        /// Progress message
        message: String,
    },
}

impl ClientEvent {
    /// Build an event from its wire name and parameters.
    ///
    /// Returns `Ok(None)` for event names that carry no lifecycle meaning.
    pub fn from_wire(name: &str, params: &Value) -> Result<Option<Self>> {
        let text = |key: &str| {
            params
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let event = match name {
            "qr" => {
                let qr = params
                    .get("qr")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::Driver("qr event without challenge".to_string()))?;
                Self::Qr { qr: qr.to_string() }
            }
            "authenticated" => Self::Authenticated,
            "auth_failure" => Self::AuthFailure {
                message: text("message"),
            },
            "ready" => Self::Ready,
            "disconnected" => Self::Disconnected {
                reason: text("reason"),
            },
            "loading_screen" => Self::LoadingScreen {
                percent: params
                    .get("percent")
                    .and_then(|p| p.as_u64().or_else(|| p.as_f64().map(|f| f as u64)))
                    .unwrap_or(0) as u32,
                message: text("message"),
            },
            _ => return Ok(None),
        };

        Ok(Some(event))
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Qr { .. } => "qr",
            Self::Authenticated => "authenticated",
            Self::AuthFailure { .. } => "auth_failure",
            Self::Ready => "ready",
            Self::Disconnected { .. } => "disconnected",
            Self::LoadingScreen { .. } => "loading_screen",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_qr_event_from_wire() {
        let event = ClientEvent::from_wire("qr", &json!({"qr": "CHALLENGE1"}))
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            ClientEvent::Qr {
                qr: "CHALLENGE1".to_string()
            }
        );
        assert_eq!(event.name(), "qr");
    }

    #[test]
    fn test_qr_event_requires_challenge() {
        let result = ClientEvent::from_wire("qr", &json!({}));
        assert!(matches!(result, Err(Error::Driver(_))));
    }

    #[test]
    fn test_unit_events_ignore_params() {
        assert_eq!(
            ClientEvent::from_wire("ready", &Value::Null).unwrap(),
            Some(ClientEvent::Ready)
        );
        assert_eq!(
            ClientEvent::from_wire("authenticated", &json!({})).unwrap(),
            Some(ClientEvent::Authenticated)
        );
    }

    #[test]
    fn test_disconnected_reason_defaults_to_empty() {
        let event = ClientEvent::from_wire("disconnected", &Value::Null)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            ClientEvent::Disconnected {
                reason: String::new()
            }
        );
    }

    #[test]
    fn test_loading_screen_accepts_fractional_percent() {
        let event = ClientEvent::from_wire(
            "loading_screen",
            &json!({"percent": 42.0, "message": "WhatsApp"}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::LoadingScreen {
                percent: 42,
                message: "WhatsApp".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_event_is_skipped() {
        assert_eq!(
            ClientEvent::from_wire("message_create", &json!({})).unwrap(),
            None
        );
    }
}
