use super::AppState;
use crate::api::extract::JsonBody;
use crate::api::models::{CreateMeetingRequest, MeetingStatus};
use crate::auth::middleware::AuthUser;
use crate::auth::roles::{authorize, Operation};
use crate::core::error::Result;
use crate::db::models::MeetingRequest;
use crate::db::repository::{new_id, now_timestamp};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

/// Handler for POST /api/meeting-requests - Ask an expert for a meeting
pub async fn create_meeting_request(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateMeetingRequest>,
) -> Result<impl IntoResponse> {
    authorize(&user, Operation::RequestMeeting)?;
    req.validate()?;

    let request = MeetingRequest {
        id: new_id(),
        requester_id: user.id.clone(),
        expert_id: req.expert_id,
        message: req.message,
        contact_info: serde_json::Value::Object(req.contact_info),
        status: MeetingStatus::Pending.as_str().to_string(),
        created_at: now_timestamp(),
        updated_at: None,
    };

    state.meeting_repo.create(&request).await?;
    tracing::info!(
        user_id = %user.id,
        expert_id = %request.expert_id,
        request_id = %request.id,
        "Meeting request created"
    );

    Ok((StatusCode::CREATED, Json(request)))
}

/// Handler for GET /api/meeting-requests - The caller's own requests
pub async fn list_meeting_requests(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<MeetingRequest>>> {
    Ok(Json(state.meeting_repo.find_by_requester(&user.id).await?))
}
