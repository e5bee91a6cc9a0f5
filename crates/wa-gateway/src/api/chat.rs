//! Chat endpoints under `/api/chat`.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::facade::{forward, Operation};
use super::{ApiError, AppState};

const CHAT: &str = "sessionId and chatId are required";

/// Messages fetched when the caller gives no limit.
const DEFAULT_MESSAGE_LIMIT: u32 = 50;

/// Chat routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list/:sessionId", Operation::new("chat.list").get())
        .route("/get/:sessionId/:chatId", Operation::new("chat.get").get())
        .route("/messages/:sessionId/:chatId", get(messages))
        .route(
            "/archive",
            Operation::new("chat.archive").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/unarchive",
            Operation::new("chat.unarchive").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/pin",
            Operation::new("chat.pin").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/unpin",
            Operation::new("chat.unpin").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/mute",
            Operation::new("chat.mute").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/unmute",
            Operation::new("chat.unmute").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/mark-unread",
            Operation::new("chat.markUnread").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/clear-messages",
            Operation::new("chat.clearMessages").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/delete",
            Operation::new("chat.delete").require(&["chatId"], CHAT).post(),
        )
        .route(
            "/pinned-messages/:sessionId/:chatId",
            Operation::new("chat.pinnedMessages").get(),
        )
        .route("/labels/:sessionId", Operation::new("chat.labels").get())
        .route(
            "/chat-labels/:sessionId/:chatId",
            Operation::new("chat.chatLabels").get(),
        )
        .route(
            "/change-labels",
            Operation::new("chat.changeLabels")
                .require(
                    &["chatId", "labelIds"],
                    "sessionId, chatId, and labelIds are required",
                )
                .post(),
        )
}

/// Query of `GET /messages/:sessionId/:chatId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    /// Number of messages to fetch
    pub limit: Option<u32>,
    /// Only fetch messages sent by the session's account
    pub from_me: Option<bool>,
}

async fn messages(
    State(state): State<AppState>,
    Path((session_id, chat_id)): Path<(String, String)>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut params = Map::new();
    params.insert("sessionId".to_string(), Value::String(session_id));
    params.insert("chatId".to_string(), Value::String(chat_id));
    params.insert(
        "limit".to_string(),
        json!(query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT)),
    );
    if let Some(from_me) = query.from_me {
        params.insert("fromMe".to_string(), Value::Bool(from_me));
    }

    forward(&state, Operation::new("chat.fetchMessages"), params).await
}
