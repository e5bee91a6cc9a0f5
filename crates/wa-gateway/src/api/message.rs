//! Messaging endpoints under `/api/message`.

use axum::Router;

use super::facade::Operation;
use super::AppState;

const CHAT: &str = "sessionId and chatId are required";
const MESSAGE: &str = "sessionId and messageId are required";

/// Message routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/send",
            Operation::new("message.send")
                .require(&["chatId", "message"], "sessionId, chatId, and message are required")
                .post(),
        )
        .route(
            "/send-media",
            Operation::new("message.sendMedia")
                .require(&["chatId"], CHAT)
                .media()
                .post(),
        )
        .route(
            "/send-location",
            Operation::new("message.sendLocation")
                .require(
                    &["chatId", "latitude", "longitude"],
                    "sessionId, chatId, latitude, and longitude are required",
                )
                .post(),
        )
        .route(
            "/send-contact",
            Operation::new("message.sendContact")
                .require(
                    &["chatId", "contactId"],
                    "sessionId, chatId, and contactId are required",
                )
                .post(),
        )
        .route(
            "/send-poll",
            Operation::new("message.sendPoll")
                .require(
                    &["chatId", "pollName", "pollOptions"],
                    "sessionId, chatId, pollName, and pollOptions are required",
                )
                .post(),
        )
        .route(
            "/broadcast",
            Operation::new("message.broadcast")
                .require(
                    &["chatIds", "message"],
                    "sessionId, chatIds (array), and message are required",
                )
                .arrays(&["chatIds"])
                .post(),
        )
        .route(
            "/broadcast-media",
            Operation::new("message.broadcastMedia")
                .require(&["chatIds"], "sessionId and chatIds (array) are required")
                .arrays(&["chatIds"])
                .media()
                .post(),
        )
        .route(
            "/reply",
            Operation::new("message.reply")
                .require(
                    &["messageId", "message"],
                    "sessionId, messageId, and message are required",
                )
                .post(),
        )
        .route(
            "/forward",
            Operation::new("message.forward")
                .require(
                    &["messageId", "chatId"],
                    "sessionId, messageId, and chatId are required",
                )
                .post(),
        )
        .route(
            "/react",
            Operation::new("message.react")
                .require(
                    &["messageId", "reaction"],
                    "sessionId, messageId, and reaction are required",
                )
                .post(),
        )
        .route(
            "/edit",
            Operation::new("message.edit")
                .require(
                    &["messageId", "newContent"],
                    "sessionId, messageId, and newContent are required",
                )
                .post(),
        )
        .route(
            "/delete",
            Operation::new("message.delete")
                .require(&["messageId"], MESSAGE)
                .post(),
        )
        .route(
            "/star",
            Operation::new("message.star")
                .require(&["messageId"], MESSAGE)
                .post(),
        )
        .route(
            "/unstar",
            Operation::new("message.unstar")
                .require(&["messageId"], MESSAGE)
                .post(),
        )
        .route(
            "/pin",
            Operation::new("message.pin")
                .require(&["messageId"], MESSAGE)
                .post(),
        )
        .route(
            "/unpin",
            Operation::new("message.unpin")
                .require(&["messageId"], MESSAGE)
                .post(),
        )
        .route(
            "/info/:sessionId/:messageId",
            Operation::new("message.info").get(),
        )
        .route(
            "/reactions/:sessionId/:messageId",
            Operation::new("message.reactions").get(),
        )
        .route(
            "/download-media",
            Operation::new("message.downloadMedia")
                .require(&["messageId"], MESSAGE)
                .post(),
        )
        .route(
            "/mark-seen",
            Operation::new("message.markSeen")
                .require(&["chatId"], CHAT)
                .post(),
        )
        .route(
            "/typing",
            Operation::new("message.typing")
                .require(&["chatId"], CHAT)
                .post(),
        )
        .route(
            "/recording",
            Operation::new("message.recording")
                .require(&["chatId"], CHAT)
                .post(),
        )
        .route(
            "/clear-state",
            Operation::new("message.clearState")
                .require(&["chatId"], CHAT)
                .post(),
        )
}
