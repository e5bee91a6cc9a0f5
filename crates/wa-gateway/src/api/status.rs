//! Status endpoints under `/api/status`.

use axum::Router;

use super::facade::Operation;
use super::AppState;

/// Status routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/set",
            Operation::new("status.set")
                .require(&["status"], "sessionId and status are required")
                .post(),
        )
        .route(
            "/text",
            Operation::new("status.text")
                .require(&["text"], "sessionId and text are required")
                .post(),
        )
        .route("/media", Operation::new("status.media").media().post())
}
