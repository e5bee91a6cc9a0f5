//! Per-session record: lifecycle state and pending QR code.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{error, info, warn};

use wa_gateway_core::{ClientEvent, QrCode, SessionId, SessionInfo, SessionState};

use crate::qr::render_data_url;
use crate::state::transition;

#[derive(Debug)]
struct RecordInner {
    state: SessionState,
    pending_qr: Option<QrCode>,
}

/// State tracked for one session.
///
/// The pending QR code is present exactly while the state is `qr`.
#[derive(Debug)]
pub struct SessionRecord {
    session_id: SessionId,
    inner: Mutex<RecordInner>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionRecord {
    /// Create a record in `initializing`.
    pub fn new(session_id: SessionId) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Initializing);
        Self {
            session_id,
            inner: Mutex::new(RecordInner {
                state: SessionState::Initializing,
                pending_qr: None,
            }),
            state_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session this record belongs to.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Pending QR code, if any.
    pub fn qr_code(&self) -> Option<QrCode> {
        self.lock().pending_qr.clone()
    }

    /// Snapshot for callers.
    pub fn info(&self) -> SessionInfo {
        let inner = self.lock();
        SessionInfo {
            session_id: self.session_id.clone(),
            state: inner.state,
            has_qr: inner.pending_qr.is_some(),
        }
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Apply a lifecycle event. Returns the new state when the event moved
    /// the session.
    pub fn apply(&self, event: &ClientEvent) -> Option<SessionState> {
        let mut inner = self.lock();
        let old = inner.state;

        let Some(next) = transition(old, event) else {
            if !matches!(event, ClientEvent::LoadingScreen { .. }) {
                warn!(
                    "Ignoring {} event: session_id={}, state={}",
                    event.name(),
                    self.session_id,
                    old
                );
            }
            return None;
        };

        inner.pending_qr = match event {
            ClientEvent::Qr { qr } => match render_data_url(qr) {
                Ok(image) => Some(QrCode {
                    challenge: qr.clone(),
                    image,
                }),
                Err(e) => {
                    error!(
                        "Error generating QR code for session {}: {}",
                        self.session_id, e
                    );
                    return None;
                }
            },
            _ => None,
        };
        inner.state = next;
        drop(inner);

        self.state_tx.send_replace(next);
        info!(
            "Session state changed: id={}, {} → {}",
            self.session_id, old, next
        );

        Some(next)
    }

    /// Move to the terminal `destroyed` state and drop any pending QR code.
    pub fn mark_destroyed(&self) {
        let mut inner = self.lock();
        inner.state = SessionState::Destroyed;
        inner.pending_qr = None;
        drop(inner);

        self.state_tx.send_replace(SessionState::Destroyed);
    }
}
