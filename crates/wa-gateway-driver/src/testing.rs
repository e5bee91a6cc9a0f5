//! In-memory client for tests.
//!
//! [`FakeFactory`] hands out [`FakeClient`]s whose lifecycle calls succeed or
//! fail on demand and which let a test emit lifecycle events by hand.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use wa_gateway_core::{ClientEvent, Error, Result, SessionId};

use crate::client::{ClientConfig, ClientFactory, EventSink, MessagingClient};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted behaviour of a fake client.
#[derive(Debug, Clone, Default)]
pub struct FakeBehavior {
    /// Fail `initialize` with this message
    pub fail_initialize: Option<String>,
    /// Fail `destroy` with this message
    pub fail_destroy: Option<String>,
    /// Fail `logout` with this message
    pub fail_logout: Option<String>,
    /// Events emitted from inside `initialize`, before it resolves
    pub initialize_events: Vec<ClientEvent>,
    /// Delay before `initialize` resolves
    pub initialize_delay: Option<Duration>,
    /// Canned results of `call`, keyed by method
    pub responses: HashMap<String, Value>,
}

/// A client that never leaves the process.
pub struct FakeClient {
    config: ClientConfig,
    events: Arc<dyn EventSink>,
    behavior: Mutex<FakeBehavior>,
    calls: Mutex<Vec<(String, Value)>>,
    destroy_count: Mutex<usize>,
    logout_count: Mutex<usize>,
}

impl FakeClient {
    /// Configuration the client was constructed with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Emit a lifecycle event as the library would.
    pub fn emit(&self, event: ClientEvent) {
        self.events.emit(event);
    }

    /// Replace the scripted behaviour.
    pub fn set_behavior(&self, behavior: FakeBehavior) {
        *lock(&self.behavior) = behavior;
    }

    /// Change only the `destroy` outcome.
    pub fn set_fail_destroy(&self, message: Option<&str>) {
        lock(&self.behavior).fail_destroy = message.map(str::to_string);
    }

    /// Every `call` received so far.
    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }

    /// Number of `destroy` invocations.
    pub fn destroy_count(&self) -> usize {
        *lock(&self.destroy_count)
    }

    /// Number of `logout` invocations.
    pub fn logout_count(&self) -> usize {
        *lock(&self.logout_count)
    }
}

#[async_trait]
impl MessagingClient for FakeClient {
    async fn initialize(&self) -> Result<()> {
        let behavior = lock(&self.behavior).clone();

        for event in behavior.initialize_events {
            self.events.emit(event);
        }
        if let Some(delay) = behavior.initialize_delay {
            tokio::time::sleep(delay).await;
        }

        match behavior.fail_initialize {
            Some(message) => Err(Error::Client(message)),
            None => Ok(()),
        }
    }

    async fn destroy(&self) -> Result<()> {
        *lock(&self.destroy_count) += 1;
        match lock(&self.behavior).fail_destroy.clone() {
            Some(message) => Err(Error::Client(message)),
            None => Ok(()),
        }
    }

    async fn logout(&self) -> Result<()> {
        *lock(&self.logout_count) += 1;
        match lock(&self.behavior).fail_logout.clone() {
            Some(message) => Err(Error::Client(message)),
            None => Ok(()),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        lock(&self.calls).push((method.to_string(), params));
        lock(&self.behavior)
            .responses
            .get(method)
            .cloned()
            .ok_or_else(|| Error::Client(format!("no response scripted for {method}")))
    }
}

/// Factory that records every client it builds.
#[derive(Default)]
pub struct FakeFactory {
    behavior: Mutex<FakeBehavior>,
    fail_construct: Mutex<Option<String>>,
    clients: Mutex<HashMap<SessionId, Arc<FakeClient>>>,
    constructed: Mutex<usize>,
}

impl FakeFactory {
    /// Create a factory whose clients succeed at everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaviour given to clients constructed from now on.
    pub fn set_behavior(&self, behavior: FakeBehavior) {
        *lock(&self.behavior) = behavior;
    }

    /// Make `construct` itself fail.
    pub fn set_fail_construct(&self, message: Option<&str>) {
        *lock(&self.fail_construct) = message.map(str::to_string);
    }

    /// Most recent client built for `session_id`.
    pub fn client(&self, session_id: &str) -> Option<Arc<FakeClient>> {
        let id = SessionId::parse(session_id).ok()?;
        lock(&self.clients).get(&id).cloned()
    }

    /// Number of clients built so far.
    pub fn constructed(&self) -> usize {
        *lock(&self.constructed)
    }
}

impl ClientFactory for FakeFactory {
    fn construct(
        &self,
        config: ClientConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<Arc<dyn MessagingClient>> {
        if let Some(message) = lock(&self.fail_construct).clone() {
            return Err(Error::Driver(message));
        }

        let client = Arc::new(FakeClient {
            config: config.clone(),
            events,
            behavior: Mutex::new(lock(&self.behavior).clone()),
            calls: Mutex::new(Vec::new()),
            destroy_count: Mutex::new(0),
            logout_count: Mutex::new(0),
        });
        lock(&self.clients).insert(config.client_id, Arc::clone(&client));
        *lock(&self.constructed) += 1;

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wa_gateway_core::{AuthSettings, DriverSettings};

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<ClientEvent>>);

    impl EventSink for RecordingSink {
        fn emit(&self, event: ClientEvent) {
            lock(&self.0).push(event);
        }
    }

    fn config(id: &str) -> ClientConfig {
        ClientConfig::new(
            SessionId::parse(id).unwrap(),
            &AuthSettings::default(),
            &DriverSettings::default(),
            Value::Null,
        )
    }

    #[tokio::test]
    async fn test_fake_emits_initialize_events() {
        let factory = FakeFactory::new();
        factory.set_behavior(FakeBehavior {
            initialize_events: vec![ClientEvent::Qr { qr: "C".to_string() }],
            ..FakeBehavior::default()
        });
        let sink = Arc::new(RecordingSink::default());

        let client = factory.construct(config("s1"), sink.clone()).unwrap();
        client.initialize().await.unwrap();

        assert_eq!(lock(&sink.0).len(), 1);
        assert!(factory.client("s1").is_some());
    }

    #[tokio::test]
    async fn test_fake_call_records_and_answers() {
        let factory = FakeFactory::new();
        let mut responses = HashMap::new();
        responses.insert("chat.list".to_string(), json!([]));
        factory.set_behavior(FakeBehavior {
            responses,
            ..FakeBehavior::default()
        });

        let client = factory
            .construct(config("s1"), Arc::new(RecordingSink::default()))
            .unwrap();
        assert_eq!(client.call("chat.list", json!({})).await.unwrap(), json!([]));
        assert!(client.call("chat.get", json!({})).await.is_err());

        let fake = factory.client("s1").unwrap();
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fake_destroy_failure_toggle() {
        let factory = FakeFactory::new();
        let client = factory
            .construct(config("s1"), Arc::new(RecordingSink::default()))
            .unwrap();
        let fake = factory.client("s1").unwrap();

        fake.set_fail_destroy(Some("busy"));
        assert!(client.destroy().await.is_err());
        fake.set_fail_destroy(None);
        assert!(client.destroy().await.is_ok());
        assert_eq!(fake.destroy_count(), 2);
    }
}
