//! Session registry coordinating every live messaging client.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info, warn};

use wa_gateway_core::{
    Ack, AuthSettings, DriverSettings, Error, QrCode, Result, ServerConfig, SessionId,
    SessionInfo, SessionState,
};
use wa_gateway_driver::{ClientConfig, ClientFactory, MessagingClient};

use crate::bridge::EventBridge;
use crate::record::SessionRecord;

/// Configuration for the session registry.
#[derive(Debug, Clone)]
pub struct ClientManagerConfig {
    /// Maximum number of concurrent sessions
    pub max_sessions: usize,

    /// Credential storage
    pub auth: AuthSettings,

    /// Client construction parameters
    pub driver: DriverSettings,
}

impl Default for ClientManagerConfig {
    fn default() -> Self {
        Self {
            max_sessions: 50,
            auth: AuthSettings::default(),
            driver: DriverSettings::default(),
        }
    }
}

impl From<&ServerConfig> for ClientManagerConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_sessions: config.server.max_sessions,
            auth: config.auth.clone(),
            driver: config.driver.clone(),
        }
    }
}

/// Per-call options for [`ClientManager::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Opaque options forwarded to the client library
    pub overrides: Value,

    /// Destroy the session if it is not ready within this window.
    /// Falls back to `driver.ready_timeout_secs` when unset.
    pub ready_timeout: Option<Duration>,
}

struct SessionEntry {
    record: Arc<SessionRecord>,
    client: Arc<dyn MessagingClient>,
}

type Sessions = HashMap<SessionId, Arc<SessionEntry>>;

/// Registry of sessions keyed by id.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone)]
pub struct ClientManager {
    sessions: Arc<RwLock<Sessions>>,
    factory: Arc<dyn ClientFactory>,
    config: Arc<ClientManagerConfig>,
}

impl ClientManager {
    /// Create a registry with default configuration.
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self::with_config(factory, ClientManagerConfig::default())
    }

    /// Create a registry with custom configuration.
    pub fn with_config(factory: Arc<dyn ClientFactory>, config: ClientManagerConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            factory,
            config: Arc::new(config),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Sessions> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Sessions> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry(&self, session_id: &SessionId) -> Result<Arc<SessionEntry>> {
        self.read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(session_id.clone()))
    }

    /// Remove `entry` only if it is still the one registered under `session_id`.
    fn remove_if_current(&self, session_id: &SessionId, entry: &Arc<SessionEntry>) -> bool {
        let mut sessions = self.write();
        match sessions.get(session_id) {
            Some(current) if Arc::ptr_eq(current, entry) => {
                sessions.remove(session_id);
                true
            }
            _ => false,
        }
    }

    /// Create a session and start its authentication handshake.
    ///
    /// Returns once the handshake has started; the session reaches `ready`
    /// later through client events.
    pub async fn create(&self, session_id: SessionId, options: CreateOptions) -> Result<Ack> {
        {
            let sessions = self.read();
            self.check_capacity(&sessions, &session_id)?;
        }

        // Spawning a driver can block, so it happens outside the registry lock
        let record = Arc::new(SessionRecord::new(session_id.clone()));
        let bridge = Arc::new(EventBridge::new(Arc::clone(&record)));
        let client_config = ClientConfig::new(
            session_id.clone(),
            &self.config.auth,
            &self.config.driver,
            options.overrides,
        );
        let client = self
            .factory
            .construct(client_config, bridge)
            .map_err(|e| Error::InitializationFailed {
                session_id: session_id.clone(),
                reason: e.to_string(),
            })?;
        let entry = Arc::new(SessionEntry { record, client });

        {
            let mut sessions = self.write();
            self.check_capacity(&sessions, &session_id)?;
            sessions.insert(session_id.clone(), Arc::clone(&entry));
        }

        info!("Creating session: {}", session_id);

        let ready_timeout = options.ready_timeout.or_else(|| {
            (self.config.driver.ready_timeout_secs > 0)
                .then(|| Duration::from_secs(self.config.driver.ready_timeout_secs))
        });
        if let Some(timeout) = ready_timeout {
            self.spawn_ready_watchdog(session_id.clone(), Arc::clone(&entry), timeout);
        }

        let mut state_rx = entry.record.subscribe();
        let torn_down = async {
            let _ = state_rx
                .wait_for(|state| *state == SessionState::Destroyed)
                .await;
        };
        let initialized = tokio::select! {
            result = entry.client.initialize() => result,
            () = torn_down => Err(Error::Other("session destroyed during initialization".to_string())),
        };

        if let Err(e) = initialized {
            error!("Error initializing client for session {}: {}", session_id, e);
            entry.record.mark_destroyed();
            self.remove_if_current(&session_id, &entry);
            return Err(Error::InitializationFailed {
                session_id,
                reason: e.to_string(),
            });
        }

        if !self.is_current(&session_id, &entry) {
            return Err(Error::InitializationFailed {
                session_id,
                reason: "session destroyed during initialization".to_string(),
            });
        }

        Ok(Ack::ok("Session created successfully"))
    }

    fn check_capacity(&self, sessions: &Sessions, session_id: &SessionId) -> Result<()> {
        if sessions.contains_key(session_id) {
            return Err(Error::SessionAlreadyExists(session_id.clone()));
        }
        if sessions.len() >= self.config.max_sessions {
            return Err(Error::SessionLimitReached(self.config.max_sessions));
        }
        Ok(())
    }

    fn is_current(&self, session_id: &SessionId, entry: &Arc<SessionEntry>) -> bool {
        self.read()
            .get(session_id)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
    }

    fn spawn_ready_watchdog(
        &self,
        session_id: SessionId,
        entry: Arc<SessionEntry>,
        timeout: Duration,
    ) {
        let manager = self.clone();
        let mut rx = entry.record.subscribe();

        tokio::spawn(async move {
            let settled = tokio::time::timeout(
                timeout,
                rx.wait_for(|state| matches!(state, SessionState::Ready | SessionState::Destroyed)),
            )
            .await
            .is_ok();
            if settled {
                return;
            }

            warn!(
                "Session {} not ready after {:?}, destroying",
                session_id, timeout
            );
            if let Err(e) = manager.teardown(&session_id, &entry).await {
                error!("Error destroying stalled session {}: {}", session_id, e);
            }
        });
    }

    /// Tear down a session, drop it from the registry and delete its
    /// stored credentials.
    ///
    /// When the client fails to tear down the session is kept so the call can
    /// be retried.
    pub async fn destroy(&self, session_id: &SessionId) -> Result<Ack> {
        let entry = self.entry(session_id)?;
        self.teardown(session_id, &entry).await?;
        Ok(Ack::ok("Session destroyed successfully"))
    }

    async fn teardown(&self, session_id: &SessionId, entry: &Arc<SessionEntry>) -> Result<()> {
        if let Err(e) = entry.client.destroy().await {
            warn!("Error destroying session {}: {}", session_id, e);
            return Err(Error::TeardownFailed {
                session_id: session_id.clone(),
                reason: e.to_string(),
            });
        }

        entry.record.mark_destroyed();
        if !self.remove_if_current(session_id, entry) {
            return Ok(());
        }

        let session_dir = self.config.auth.session_dir(session_id);
        if tokio::fs::try_exists(&session_dir).await? {
            tokio::fs::remove_dir_all(&session_dir).await?;
            info!("Removed credentials for session {}", session_id);
        }

        info!("Session destroyed: {}", session_id);
        Ok(())
    }

    /// Invalidate the remote authentication. The session stays registered.
    pub async fn logout(&self, session_id: &SessionId) -> Result<Ack> {
        let entry = self.entry(session_id)?;

        entry.client.logout().await.map_err(|e| {
            warn!("Error logging out session {}: {}", session_id, e);
            Error::TeardownFailed {
                session_id: session_id.clone(),
                reason: e.to_string(),
            }
        })?;

        info!("Session logged out: {}", session_id);
        Ok(Ack::ok("Session logged out successfully"))
    }

    /// Pending QR code of a session.
    pub fn qr_code(&self, session_id: &SessionId) -> Result<QrCode> {
        self.read()
            .get(session_id)
            .and_then(|entry| entry.record.qr_code())
            .ok_or_else(|| Error::QrNotAvailable(session_id.clone()))
    }

    /// State snapshot of one session.
    pub fn session_state(&self, session_id: &SessionId) -> Result<SessionInfo> {
        Ok(self.entry(session_id)?.record.info())
    }

    /// State snapshots of every session, sorted by id.
    pub fn all_sessions(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self
            .read()
            .values()
            .map(|entry| entry.record.info())
            .collect();
        infos.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        infos
    }

    /// Client handle of a session that is `ready`.
    pub fn client(&self, session_id: &SessionId) -> Result<Arc<dyn MessagingClient>> {
        let entry = self.entry(session_id)?;
        match entry.record.state() {
            SessionState::Ready => Ok(Arc::clone(&entry.client)),
            state => Err(Error::SessionNotReady {
                session_id: session_id.clone(),
                state,
            }),
        }
    }

    /// Whether the session exists and is `ready`.
    pub fn is_ready(&self, session_id: &SessionId) -> bool {
        self.read()
            .get(session_id)
            .is_some_and(|entry| entry.record.state() == SessionState::Ready)
    }

    /// Number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.read().len()
    }

    /// Wait until the session reaches `ready`.
    pub async fn wait_until_ready(&self, session_id: &SessionId, timeout: Duration) -> Result<()> {
        let mut rx = self.entry(session_id)?.record.subscribe();

        let outcome = tokio::time::timeout(
            timeout,
            rx.wait_for(|state| matches!(state, SessionState::Ready | SessionState::Destroyed)),
        )
        .await;

        match outcome {
            Ok(Ok(state)) if *state == SessionState::Ready => Ok(()),
            Ok(_) => Err(Error::SessionNotFound(session_id.clone())),
            Err(_) => Err(Error::WaitTimeout(timeout.as_millis() as u64)),
        }
    }

    /// Tear down every client, keeping stored credentials so sessions can be
    /// restored on the next start.
    pub async fn shutdown(&self) {
        let entries: Vec<(SessionId, Arc<SessionEntry>)> = self.write().drain().collect();

        for (session_id, entry) in entries {
            if let Err(e) = entry.client.destroy().await {
                warn!("Error shutting down session {}: {}", session_id, e);
            }
            entry.record.mark_destroyed();
        }

        info!("All sessions shut down");
    }
}
