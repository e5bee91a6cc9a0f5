//! Driver process client.
//!
//! Each session runs the messaging client library in its own child process
//! (by default `node driver/index.js`). The process receives requests on
//! stdin and writes responses and lifecycle events to stdout, one JSON
//! document per line. Its stderr is forwarded to the log.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use wa_gateway_core::{DriverSettings, Error, Result, SessionId};

use crate::client::{ClientConfig, ClientFactory, EventSink, MessagingClient};
use crate::connection::Connection;

/// How long a driver may take to exit after acknowledging `destroy`.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Spawns one driver process per session.
#[derive(Debug, Clone)]
pub struct DriverFactory {
    settings: DriverSettings,
}

impl DriverFactory {
    /// Create a factory for the configured driver command.
    pub fn new(settings: DriverSettings) -> Self {
        Self { settings }
    }
}

impl ClientFactory for DriverFactory {
    fn construct(
        &self,
        config: ClientConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<Arc<dyn MessagingClient>> {
        let session_id = config.client_id.clone();
        info!(
            "Spawning driver: session_id={}, command='{}', args={:?}",
            session_id, self.settings.command, self.settings.args
        );

        let mut child = Command::new(&self.settings.command)
            .args(&self.settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Driver(format!(
                    "failed to spawn '{}': {e}",
                    self.settings.command
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Driver("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Driver("driver stdout unavailable".to_string()))?;
        let stderr_task = child.stderr.take().map(|stderr| {
            let session_id = session_id.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("driver[{}]: {}", session_id, line);
                }
            })
        });

        let (connection, reader_task) = Connection::spawn(stdin, stdout, events);

        Ok(Arc::new(DriverClient {
            config,
            connection,
            child: Mutex::new(Some(child)),
            reader_task,
            stderr_task,
        }))
    }
}

/// Client handle backed by a driver process.
pub struct DriverClient {
    config: ClientConfig,
    connection: Arc<Connection>,
    child: Mutex<Option<Child>>,
    reader_task: JoinHandle<()>,
    stderr_task: Option<JoinHandle<()>>,
}

impl DriverClient {
    /// Session this client belongs to.
    pub fn session_id(&self) -> &SessionId {
        &self.config.client_id
    }

    async fn has_exited(&self) -> bool {
        if self.connection.is_closed().await {
            return true;
        }
        match self.child.lock().await.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => true,
        }
    }

    async fn reap(&self) {
        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };

        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!("Driver exited: session_id={}, {}", self.session_id(), status),
            Ok(Err(e)) => warn!("Failed to wait for driver {}: {}", self.session_id(), e),
            Err(_) => {
                warn!(
                    "Driver for {} did not exit within {:?}, killing",
                    self.session_id(),
                    EXIT_GRACE
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill driver {}: {}", self.session_id(), e);
                }
            }
        }
    }
}

#[async_trait]
impl MessagingClient for DriverClient {
    async fn initialize(&self) -> Result<()> {
        let params = serde_json::to_value(&self.config)?;
        self.connection.send_message("initialize", params).await?;
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        if let Err(e) = self.connection.send_message("destroy", Value::Null).await {
            // Nothing left to tear down once the driver is gone
            if !matches!(e, Error::Driver(_)) || !self.has_exited().await {
                return Err(e);
            }
            debug!("Driver for {} already gone: {}", self.session_id(), e);
        }
        self.reap().await;
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.connection.send_message("logout", Value::Null).await?;
        Ok(())
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.connection.send_message(method, params).await
    }
}

impl Drop for DriverClient {
    fn drop(&mut self) {
        // The child itself is killed by kill_on_drop
        self.reader_task.abort();
        if let Some(task) = &self.stderr_task {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wa_gateway_core::{AuthSettings, ClientEvent};

    struct NullSink;

    impl EventSink for NullSink {
        fn emit(&self, _event: ClientEvent) {}
    }

    fn config() -> ClientConfig {
        ClientConfig::new(
            SessionId::parse("s1").unwrap(),
            &AuthSettings {
                data_path: PathBuf::from("/tmp/wa-gateway-test"),
            },
            &DriverSettings::default(),
            Value::Null,
        )
    }

    #[tokio::test]
    async fn test_missing_driver_binary_is_driver_error() {
        let factory = DriverFactory::new(DriverSettings {
            command: "/nonexistent/wa-gateway-driver".to_string(),
            args: vec![],
            ..DriverSettings::default()
        });

        let result = factory.construct(config(), Arc::new(NullSink));
        assert!(matches!(result, Err(Error::Driver(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_driver_that_exits_fails_initialize() {
        let factory = DriverFactory::new(DriverSettings {
            command: "true".to_string(),
            args: vec![],
            ..DriverSettings::default()
        });

        let client = factory.construct(config(), Arc::new(NullSink)).unwrap();
        let result = client.initialize().await;
        assert!(matches!(result, Err(Error::Driver(_))));

        // Tearing down a driver that already exited succeeds
        assert!(client.destroy().await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scripted_driver_acknowledges_initialize() {
        // Answers the first request (id 0) and keeps stdin open
        let factory = DriverFactory::new(DriverSettings {
            command: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"read line; echo '{"id":0,"result":null}'; cat > /dev/null"#.to_string(),
            ],
            ..DriverSettings::default()
        });

        let client = factory.construct(config(), Arc::new(NullSink)).unwrap();
        assert!(client.initialize().await.is_ok());
    }
}
