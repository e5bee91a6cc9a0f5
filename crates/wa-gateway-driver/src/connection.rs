//! JSON-line connection to a driver process.
//!
//! Implements request/response correlation on top of a byte stream pair:
//! every request carries a sequential id, the matching response completes a
//! oneshot channel, and messages without an id are lifecycle events that are
//! forwarded to an [`EventSink`] in arrival order.
//!
//! # Wire format
//!
//! One JSON document per line:
//!
//! ```json
//! {"id": 3, "method": "chat.archive", "params": {"chatId": "123@c.us"}}
//! {"id": 3, "result": null}
//! {"id": 4, "error": {"message": "chat not found", "name": "Error"}}
//! {"event": "qr", "params": {"qr": "2@abc..."}}
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use wa_gateway_core::{ClientEvent, Error, Result};

use crate::client::EventSink;

/// Reason reported when the driver's output stream ends.
pub const DRIVER_EXITED: &str = "driver exited";

/// Request sent to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Sequential id used to correlate the response
    pub id: u32,
    /// Operation name
    pub method: String,
    /// Operation parameters
    pub params: Value,
}

/// Response from the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Id of the request this answers
    pub id: u32,
    /// Success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// Error details reported by the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error message
    pub message: String,
    /// Error class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Lifecycle event pushed by the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Event name
    pub event: String,
    /// Event parameters
    #[serde(default)]
    pub params: Value,
}

/// Any message read from the driver; responses are the ones carrying an `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Response to a request
    Response(Response),
    /// Unsolicited event
    Event(EventMessage),
}

type Callbacks = HashMap<u32, oneshot::Sender<Result<Value>>>;

struct Pending {
    callbacks: Callbacks,
    closed: bool,
}

/// Connection to one driver process.
pub struct Connection {
    last_id: AtomicU32,
    pending: Mutex<Pending>,
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl Connection {
    /// Create a connection and spawn its read loop.
    ///
    /// Events read from `reader` are delivered to `events`. The returned
    /// handle completes once `reader` reaches end of stream.
    pub fn spawn<W, R>(
        writer: W,
        reader: R,
        events: Arc<dyn EventSink>,
    ) -> (Arc<Self>, JoinHandle<()>)
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        let connection = Arc::new(Self {
            last_id: AtomicU32::new(0),
            pending: Mutex::new(Pending {
                callbacks: HashMap::new(),
                closed: false,
            }),
            writer: Mutex::new(Box::new(writer)),
        });

        let handle = tokio::spawn(Arc::clone(&connection).run(reader, events));
        (connection, handle)
    }

    /// Send a request and wait for its response.
    pub async fn send_message(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();

        {
            let mut pending = self.pending.lock().await;
            if pending.closed {
                return Err(Error::Driver(DRIVER_EXITED.to_string()));
            }
            pending.callbacks.insert(id, tx);
        }

        let request = Request {
            id,
            method: method.to_string(),
            params,
        };
        let mut line = serde_json::to_vec(&request)?;
        line.push(b'\n');

        debug!("-> driver: id={}, method={}", id, method);

        let written = {
            let mut writer = self.writer.lock().await;
            match writer.write_all(&line).await {
                Ok(()) => writer.flush().await,
                Err(e) => Err(e),
            }
        };

        if let Err(e) = written {
            self.pending.lock().await.callbacks.remove(&id);
            return Err(Error::Driver(format!("failed to write request: {e}")));
        }

        rx.await
            .map_err(|_| Error::Driver(DRIVER_EXITED.to_string()))
            .and_then(|result| result)
    }

    /// Whether the driver's output stream has ended.
    pub async fn is_closed(&self) -> bool {
        self.pending.lock().await.closed
    }

    async fn run<R>(self: Arc<Self>, reader: R, events: Arc<dyn EventSink>)
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut lines = BufReader::new(reader).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Message>(&line) {
                        Ok(message) => {
                            if let Err(e) = self.dispatch(message, events.as_ref()).await {
                                warn!("Error dispatching driver message: {}", e);
                            }
                        }
                        Err(e) => {
                            error!("Failed to parse driver message: {} - line: {}", e, line);
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Driver read error: {}", e);
                    break;
                }
            }
        }

        debug!("Driver message loop ended");
        self.close(events.as_ref()).await;
    }

    async fn dispatch(&self, message: Message, events: &dyn EventSink) -> Result<()> {
        match message {
            Message::Response(response) => {
                let callback = self
                    .pending
                    .lock()
                    .await
                    .callbacks
                    .remove(&response.id)
                    .ok_or_else(|| {
                        Error::Driver(format!(
                            "Cannot find request to respond: id={}",
                            response.id
                        ))
                    })?;

                let result = match response.error {
                    Some(payload) => Err(Error::Client(payload.message)),
                    None => Ok(response.result.unwrap_or(Value::Null)),
                };

                // Receiver may have been dropped by a cancelled caller
                let _ = callback.send(result);
                Ok(())
            }
            Message::Event(message) => {
                debug!("<- driver event: {}", message.event);
                if let Some(event) = ClientEvent::from_wire(&message.event, &message.params)? {
                    events.emit(event);
                }
                Ok(())
            }
        }
    }

    async fn close(&self, events: &dyn EventSink) {
        let callbacks = {
            let mut pending = self.pending.lock().await;
            pending.closed = true;
            std::mem::take(&mut pending.callbacks)
        };

        for (_, callback) in callbacks {
            let _ = callback.send(Err(Error::Driver(DRIVER_EXITED.to_string())));
        }

        events.emit(ClientEvent::Disconnected {
            reason: DRIVER_EXITED.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use tokio::io::{duplex, DuplexStream};

    #[derive(Default)]
    struct RecordingSink {
        events: StdMutex<Vec<ClientEvent>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: ClientEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct Harness {
        connection: Arc<Connection>,
        reader_task: JoinHandle<()>,
        /// Driver side: requests arrive here
        requests: tokio::io::Lines<BufReader<DuplexStream>>,
        /// Driver side: responses and events are written here
        driver_out: DuplexStream,
        sink: Arc<RecordingSink>,
    }

    fn create_test_connection() -> Harness {
        let (client_in, driver_in) = duplex(4096);
        let (client_out, driver_out) = duplex(4096);
        let sink = Arc::new(RecordingSink::default());
        let (connection, reader_task) =
            Connection::spawn(client_in, client_out, sink.clone() as Arc<dyn EventSink>);

        Harness {
            connection,
            reader_task,
            requests: BufReader::new(driver_in).lines(),
            driver_out,
            sink,
        }
    }

    async fn reply(out: &mut DuplexStream, value: Value) {
        let mut line = serde_json::to_vec(&value).unwrap();
        line.push(b'\n');
        out.write_all(&line).await.unwrap();
    }

    #[test]
    fn test_message_deserialization_response() {
        let message: Message = serde_json::from_str(r#"{"id": 42, "result": {"ok": true}}"#).unwrap();
        match message {
            Message::Response(response) => {
                assert_eq!(response.id, 42);
                assert!(response.result.is_some());
                assert!(response.error.is_none());
            }
            _ => panic!("Expected Response"),
        }
    }

    #[test]
    fn test_message_deserialization_event() {
        let message: Message =
            serde_json::from_str(r#"{"event": "qr", "params": {"qr": "abc"}}"#).unwrap();
        match message {
            Message::Event(event) => {
                assert_eq!(event.event, "qr");
                assert_eq!(event.params["qr"], "abc");
            }
            _ => panic!("Expected Event"),
        }
    }

    #[tokio::test]
    async fn test_request_response_roundtrip() {
        let mut h = create_test_connection();
        let connection = Arc::clone(&h.connection);

        let call = tokio::spawn(async move {
            connection
                .send_message("chat.archive", json!({"chatId": "1@c.us"}))
                .await
        });

        let line = h.requests.next_line().await.unwrap().unwrap();
        let request: Request = serde_json::from_str(&line).unwrap();
        assert_eq!(request.id, 0);
        assert_eq!(request.method, "chat.archive");
        assert_eq!(request.params["chatId"], "1@c.us");

        reply(&mut h.driver_out, json!({"id": 0, "result": {"archived": true}})).await;

        let result = call.await.unwrap().unwrap();
        assert_eq!(result["archived"], true);
    }

    #[tokio::test]
    async fn test_error_response_becomes_client_error() {
        let mut h = create_test_connection();
        let connection = Arc::clone(&h.connection);

        let call = tokio::spawn(async move { connection.send_message("logout", Value::Null).await });

        let _ = h.requests.next_line().await.unwrap().unwrap();
        reply(
            &mut h.driver_out,
            json!({"id": 0, "error": {"message": "not logged in", "name": "Error"}}),
        )
        .await;

        match call.await.unwrap() {
            Err(Error::Client(msg)) => assert_eq!(msg, "not logged in"),
            other => panic!("Expected Client error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_responses_out_of_order() {
        let mut h = create_test_connection();
        let c1 = Arc::clone(&h.connection);
        let c2 = Arc::clone(&h.connection);

        let first = tokio::spawn(async move { c1.send_message("a", Value::Null).await });
        let _ = h.requests.next_line().await.unwrap().unwrap();
        let second = tokio::spawn(async move { c2.send_message("b", Value::Null).await });
        let _ = h.requests.next_line().await.unwrap().unwrap();

        reply(&mut h.driver_out, json!({"id": 1, "result": "b"})).await;
        reply(&mut h.driver_out, json!({"id": 0, "result": "a"})).await;

        assert_eq!(first.await.unwrap().unwrap(), json!("a"));
        assert_eq!(second.await.unwrap().unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn test_events_forwarded_in_order() {
        let mut h = create_test_connection();

        reply(&mut h.driver_out, json!({"event": "qr", "params": {"qr": "C1"}})).await;
        reply(&mut h.driver_out, json!({"event": "authenticated"})).await;
        reply(&mut h.driver_out, json!({"event": "ready", "params": null})).await;
        drop(h.driver_out);
        h.reader_task.await.unwrap();

        let events = h.sink.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                ClientEvent::Qr {
                    qr: "C1".to_string()
                },
                ClientEvent::Authenticated,
                ClientEvent::Ready,
                ClientEvent::Disconnected {
                    reason: DRIVER_EXITED.to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_driver_exit_fails_pending_requests() {
        let mut h = create_test_connection();
        let connection = Arc::clone(&h.connection);

        let call = tokio::spawn(async move { connection.send_message("initialize", Value::Null).await });
        let _ = h.requests.next_line().await.unwrap().unwrap();

        drop(h.driver_out);
        h.reader_task.await.unwrap();

        assert!(matches!(call.await.unwrap(), Err(Error::Driver(_))));
        assert!(h.connection.is_closed().await);

        let after = h.connection.send_message("destroy", Value::Null).await;
        assert!(matches!(after, Err(Error::Driver(_))));
    }

    #[tokio::test]
    async fn test_garbage_lines_are_skipped() {
        let mut h = create_test_connection();

        h.driver_out.write_all(b"not json\n\n").await.unwrap();
        reply(&mut h.driver_out, json!({"event": "ready"})).await;
        drop(h.driver_out);
        h.reader_task.await.unwrap();

        let events = h.sink.events.lock().unwrap().clone();
        assert_eq!(events.first(), Some(&ClientEvent::Ready));
    }
}
