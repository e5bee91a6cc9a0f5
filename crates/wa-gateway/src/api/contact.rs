//! Contact endpoints under `/api/contact`.

use axum::Router;

use super::facade::Operation;
use super::AppState;

const CONTACT: &str = "sessionId and contactId are required";

/// Contact routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list/:sessionId", Operation::new("contact.list").get())
        .route(
            "/get/:sessionId/:contactId",
            Operation::new("contact.get").get(),
        )
        .route(
            "/profile-pic/:sessionId/:contactId",
            Operation::new("contact.profilePic").get(),
        )
        .route(
            "/about/:sessionId/:contactId",
            Operation::new("contact.about").get(),
        )
        .route(
            "/common-groups/:sessionId/:contactId",
            Operation::new("contact.commonGroups").get(),
        )
        .route(
            "/block",
            Operation::new("contact.block")
                .require(&["contactId"], CONTACT)
                .post(),
        )
        .route(
            "/unblock",
            Operation::new("contact.unblock")
                .require(&["contactId"], CONTACT)
                .post(),
        )
        .route(
            "/formatted-number/:sessionId/:contactId",
            Operation::new("contact.formattedNumber").get(),
        )
        .route(
            "/country-code/:sessionId/:contactId",
            Operation::new("contact.countryCode").get(),
        )
        .route(
            "/number-exists/:sessionId/:number",
            Operation::new("contact.numberExists").get(),
        )
}
