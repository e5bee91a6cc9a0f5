//! Lifecycle state machine.

use wa_gateway_core::{ClientEvent, SessionState};

/// Next state after `event`, or `None` when the event does not move the
/// session (loading progress, out-of-order events, anything after teardown).
pub fn transition(state: SessionState, event: &ClientEvent) -> Option<SessionState> {
    use SessionState::*;

    if state == Destroyed {
        return None;
    }

    match (state, event) {
        (_, ClientEvent::LoadingScreen { .. }) => None,
        (_, ClientEvent::Qr { .. }) => Some(Qr),
        (Initializing | Qr | Disconnected, ClientEvent::Authenticated) => Some(Authenticated),
        (_, ClientEvent::Authenticated) => None,
        (_, ClientEvent::AuthFailure { .. }) => Some(AuthFailure),
        (Authenticated, ClientEvent::Ready) => Some(Ready),
        (_, ClientEvent::Ready) => None,
        (_, ClientEvent::Disconnected { .. }) => Some(Disconnected),
    }
}
