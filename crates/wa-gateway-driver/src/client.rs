//! Capability interface of the external messaging client.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use wa_gateway_core::{AuthSettings, ClientEvent, DriverSettings, Result, SessionId};

/// A live connection to the messaging client library for one session.
///
/// Implementations are not required to be reentrant; callers that issue
/// overlapping operations against the same handle serialize them themselves.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Start the authentication handshake. Resolves once the handshake has
    /// started, not once the client is ready.
    async fn initialize(&self) -> Result<()>;

    /// Tear down the connection and release the underlying runtime.
    async fn destroy(&self) -> Result<()>;

    /// Invalidate the remote authentication.
    async fn logout(&self) -> Result<()>;

    /// Invoke one resource operation, e.g. `chat.archive`.
    async fn call(&self, method: &str, params: Value) -> Result<Value>;
}

/// Receiver of lifecycle events emitted by a client, in emission order.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: ClientEvent);
}

/// Builds client handles.
pub trait ClientFactory: Send + Sync {
    /// Construct a client for `config`, delivering its events to `events`.
    ///
    /// Must be called from within a tokio runtime.
    fn construct(
        &self,
        config: ClientConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<Arc<dyn MessagingClient>>;
}

/// Browser runtime options passed through to the library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuppeteerConfig {
    /// Run without a window
    pub headless: bool,
    /// Extra browser flags
    pub args: Vec<String>,
}

/// Session-scoped construction parameters for a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Identity used to scope credential storage
    pub client_id: SessionId,
    /// Credential storage root
    pub data_path: PathBuf,
    /// Browser runtime options
    pub puppeteer: PuppeteerConfig,
    /// Caller-supplied options, passed through untouched
    pub overrides: Value,
}

impl ClientConfig {
    /// Build the configuration for `client_id` from server settings.
    pub fn new(
        client_id: SessionId,
        auth: &AuthSettings,
        driver: &DriverSettings,
        overrides: Value,
    ) -> Self {
        Self {
            client_id,
            data_path: auth.data_path.clone(),
            puppeteer: PuppeteerConfig {
                headless: driver.headless,
                args: driver.browser_args.clone(),
            },
            overrides,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_config_from_settings() {
        let id = SessionId::parse("s1").unwrap();
        let config = ClientConfig::new(
            id.clone(),
            &AuthSettings::default(),
            &DriverSettings::default(),
            Value::Null,
        );
        assert_eq!(config.client_id, id);
        assert_eq!(config.data_path, PathBuf::from("./.wwebjs_auth"));
        assert!(config.puppeteer.headless);
        assert!(config.puppeteer.args.contains(&"--no-sandbox".to_string()));
    }

    #[test]
    fn test_client_config_wire_format() {
        let config = ClientConfig {
            client_id: SessionId::parse("s1").unwrap(),
            data_path: PathBuf::from("/data"),
            puppeteer: PuppeteerConfig {
                headless: true,
                args: vec!["--no-gpu".to_string()],
            },
            overrides: json!({"webVersion": "2.3000"}),
        };
        let wire = serde_json::to_value(&config).unwrap();
        assert_eq!(
            wire,
            json!({
                "clientId": "s1",
                "dataPath": "/data",
                "puppeteer": {"headless": true, "args": ["--no-gpu"]},
                "overrides": {"webVersion": "2.3000"}
            })
        );
    }
}
