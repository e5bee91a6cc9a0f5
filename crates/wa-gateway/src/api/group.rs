//! Group endpoints under `/api/group`.

use axum::Router;

use super::facade::Operation;
use super::AppState;

const GROUP: &str = "sessionId and groupId are required";
const PARTICIPANTS: &str = "sessionId, groupId, and participants (array) are required";
const REQUESTS: &str = "sessionId, groupId, and options are required";

fn participants(call: &'static str) -> Operation {
    Operation::new(call)
        .require(&["groupId", "participants"], PARTICIPANTS)
        .arrays(&["participants"])
}

fn group(call: &'static str) -> Operation {
    Operation::new(call).require(&["groupId"], GROUP)
}

/// Group routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/create",
            Operation::new("group.create")
                .require(
                    &["name", "participants"],
                    "sessionId, name, and participants (array) are required",
                )
                .arrays(&["participants"])
                .post(),
        )
        .route("/info/:sessionId/:groupId", Operation::new("group.info").get())
        .route(
            "/add-participants",
            participants("group.addParticipants").post(),
        )
        .route(
            "/remove-participants",
            participants("group.removeParticipants").post(),
        )
        .route(
            "/promote-participants",
            participants("group.promoteParticipants").post(),
        )
        .route(
            "/demote-participants",
            participants("group.demoteParticipants").post(),
        )
        .route(
            "/set-subject",
            Operation::new("group.setSubject")
                .require(
                    &["groupId", "subject"],
                    "sessionId, groupId, and subject are required",
                )
                .post(),
        )
        .route(
            "/set-description",
            Operation::new("group.setDescription")
                .require(
                    &["groupId", "description"],
                    "sessionId, groupId, and description are required",
                )
                .post(),
        )
        .route(
            "/set-picture",
            group("group.setPicture").media().post(),
        )
        .route("/delete-picture", group("group.deletePicture").post())
        .route(
            "/invite-code/:sessionId/:groupId",
            Operation::new("group.inviteCode").get(),
        )
        .route("/revoke-invite", group("group.revokeInvite").post())
        .route(
            "/join-by-code",
            Operation::new("group.joinByCode")
                .require(&["inviteCode"], "sessionId and inviteCode are required")
                .post(),
        )
        .route("/leave", group("group.leave").post())
        .route(
            "/set-messages-admins-only",
            group("group.setMessagesAdminsOnly").post(),
        )
        .route(
            "/set-info-admins-only",
            group("group.setInfoAdminsOnly").post(),
        )
        .route(
            "/set-add-members-admins-only",
            group("group.setAddMembersAdminsOnly").post(),
        )
        .route(
            "/membership-requests/:sessionId/:groupId",
            Operation::new("group.membershipRequests").get(),
        )
        .route(
            "/approve-membership-requests",
            Operation::new("group.approveMembershipRequests")
                .require(&["groupId", "options"], REQUESTS)
                .post(),
        )
        .route(
            "/reject-membership-requests",
            Operation::new("group.rejectMembershipRequests")
                .require(&["groupId", "options"], REQUESTS)
                .post(),
        )
}
