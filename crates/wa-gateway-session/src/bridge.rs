//! Event bridge from a client's lifecycle notifications to its record.

use std::sync::Arc;

use tracing::{debug, info, warn};

use wa_gateway_core::ClientEvent;
use wa_gateway_driver::EventSink;

use crate::record::SessionRecord;

/// Applies a client's events to the record it was created with.
///
/// The bridge is bound to one record rather than to a session id, so a
/// client that outlives its registration can never touch a newer session
/// registered under the same id.
#[derive(Debug, Clone)]
pub struct EventBridge {
    record: Arc<SessionRecord>,
}

impl EventBridge {
    /// Bridge events into `record`.
    pub fn new(record: Arc<SessionRecord>) -> Self {
        Self { record }
    }
}

impl EventSink for EventBridge {
    fn emit(&self, event: ClientEvent) {
        let session_id = self.record.session_id();

        match &event {
            ClientEvent::Qr { .. } => info!("QR Code received for session: {}", session_id),
            ClientEvent::Authenticated => info!("Session authenticated: {}", session_id),
            ClientEvent::AuthFailure { message } => {
                warn!("Authentication failed for session {}: {}", session_id, message)
            }
            ClientEvent::Ready => info!("Client ready for session: {}", session_id),
            ClientEvent::Disconnected { reason } => {
                info!("Client disconnected for session {}: {}", session_id, reason)
            }
            ClientEvent::LoadingScreen { percent, message } => debug!(
                "Loading screen for session {}: {}% {}",
                session_id, percent, message
            ),
        }

        self.record.apply(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wa_gateway_core::{SessionId, SessionState};

    #[test]
    fn test_bridge_drives_record() {
        let record = Arc::new(SessionRecord::new(SessionId::parse("s1").unwrap()));
        let bridge = EventBridge::new(Arc::clone(&record));

        bridge.emit(ClientEvent::Qr {
            qr: "CHALLENGE1".to_string(),
        });
        assert_eq!(record.state(), SessionState::Qr);

        bridge.emit(ClientEvent::LoadingScreen {
            percent: 80,
            message: "WhatsApp".to_string(),
        });
        assert_eq!(record.state(), SessionState::Qr);

        bridge.emit(ClientEvent::Authenticated);
        bridge.emit(ClientEvent::Ready);
        assert_eq!(record.state(), SessionState::Ready);

        bridge.emit(ClientEvent::Disconnected {
            reason: "NAVIGATION".to_string(),
        });
        assert_eq!(record.state(), SessionState::Disconnected);
    }
}
