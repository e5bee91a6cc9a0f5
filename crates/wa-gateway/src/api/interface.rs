//! Web interface endpoints under `/api/interface`.

use axum::Router;

use super::facade::Operation;
use super::AppState;

const CHAT: &str = "sessionId and chatId are required";
const MESSAGE: &str = "sessionId and messageId are required";
const FEATURES: &str = "sessionId and features (array) are required";

/// Interface routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/open-chat-window",
            Operation::new("interface.openChatWindow")
                .require(&["chatId"], CHAT)
                .post(),
        )
        .route(
            "/open-chat-window-at",
            Operation::new("interface.openChatWindowAt")
                .require(&["messageId"], MESSAGE)
                .post(),
        )
        .route(
            "/open-chat-drawer",
            Operation::new("interface.openChatDrawer")
                .require(&["chatId"], CHAT)
                .post(),
        )
        .route(
            "/open-message-drawer",
            Operation::new("interface.openMessageDrawer")
                .require(&["messageId"], MESSAGE)
                .post(),
        )
        .route(
            "/open-chat-search",
            Operation::new("interface.openChatSearch")
                .require(&["chatId"], CHAT)
                .post(),
        )
        .route(
            "/close-right-drawer",
            Operation::new("interface.closeRightDrawer").post(),
        )
        .route(
            "/features/:sessionId",
            Operation::new("interface.features").get(),
        )
        .route(
            "/enable-features",
            Operation::new("interface.enableFeatures")
                .require(&["features"], FEATURES)
                .arrays(&["features"])
                .post(),
        )
        .route(
            "/disable-features",
            Operation::new("interface.disableFeatures")
                .require(&["features"], FEATURES)
                .arrays(&["features"])
                .post(),
        )
        .route(
            "/check-feature-status",
            Operation::new("interface.checkFeatureStatus")
                .require(&["feature"], "sessionId and feature are required")
                .post(),
        )
}
