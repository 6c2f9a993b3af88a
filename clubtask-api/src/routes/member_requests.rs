/// Membership approval endpoints
///
/// # Endpoints
///
/// - `GET /member-requests?status=` - List requests (defaults to pending)
/// - `PUT /member-requests/:id` - Approve or reject a request
///
/// Both are admin-only. Approval unlocks the user and removes the
/// request; rejection deletes the user and keeps the request as the
/// decision record.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use clubtask_shared::{
    auth::{
        authorization::{require, Operation},
        middleware::AuthContext,
    },
    models::{MemberRequest, RequestStatus, Role},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Member request as exposed over the wire
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub role: Role,
    pub status: RequestStatus,
    pub submitted_at: DateTime<Utc>,
}

impl From<MemberRequest> for MemberRequestResponse {
    fn from(request: MemberRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            full_name: request.full_name,
            email: request.email,
            phone_number: request.phone_number,
            role: request.role,
            status: request.status,
            submitted_at: request.submitted_at,
        }
    }
}

/// Status filter for the list endpoint
///
/// Absent means pending (the admin work queue); `all` lifts the filter.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// Request list envelope
#[derive(Debug, Serialize)]
pub struct RequestListResponse {
    pub success: bool,
    pub data: Vec<MemberRequestResponse>,
}

/// Decision request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct HandleRequest {
    pub action: RequestAction,
}

/// Decision response
#[derive(Debug, Serialize)]
pub struct HandleResponse {
    pub message: String,
    pub request: MemberRequestResponse,
}

/// Lists membership requests
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<RequestListResponse>> {
    require(auth.role, Operation::HandleMemberRequests)?;

    let filter = match query.status.as_deref() {
        None | Some("pending") => Some(RequestStatus::Pending),
        Some("approved") => Some(RequestStatus::Approved),
        Some("rejected") => Some(RequestStatus::Rejected),
        Some("all") => None,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Unknown status filter: {}",
                other
            )))
        }
    };

    let requests = MemberRequest::list(&state.db, filter).await?;

    Ok(Json(RequestListResponse {
        success: true,
        data: requests
            .into_iter()
            .map(MemberRequestResponse::from)
            .collect(),
    }))
}

/// Approves or rejects a request
///
/// Approval also accepts a rejected request: that clears the rejection
/// record and lets the applicant sign up again. Rejecting an
/// already-rejected request is a conflict.
pub async fn handle_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<HandleRequest>,
) -> ApiResult<Json<HandleResponse>> {
    require(auth.role, Operation::HandleMemberRequests)?;

    let decided = match req.action {
        RequestAction::Approve => MemberRequest::approve(&state.db, id).await?,
        RequestAction::Reject => MemberRequest::reject(&state.db, id).await?,
    };

    match decided {
        Some(request) => {
            let message = match req.action {
                RequestAction::Approve => "Member request approved",
                RequestAction::Reject => "Member request rejected",
            };

            tracing::info!(
                request_id = %request.id,
                user_id = %request.user_id,
                admin = %auth.user_id,
                decision = message,
                "Membership request decided"
            );

            Ok(Json(HandleResponse {
                message: message.to_string(),
                request: MemberRequestResponse::from(request),
            }))
        }
        None => match MemberRequest::find_by_id(&state.db, id).await? {
            Some(request) => Err(ApiError::Conflict(format!(
                "Request is already {}",
                request.status.as_str()
            ))),
            None => Err(ApiError::NotFound("Member request not found".to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_deserializes_lowercase() {
        let req: HandleRequest = serde_json::from_str(r#"{"action": "approve"}"#).unwrap();
        assert!(matches!(req.action, RequestAction::Approve));

        let req: HandleRequest = serde_json::from_str(r#"{"action": "reject"}"#).unwrap();
        assert!(matches!(req.action, RequestAction::Reject));

        assert!(serde_json::from_str::<HandleRequest>(r#"{"action": "defer"}"#).is_err());
    }

    #[test]
    fn test_list_envelope_shape() {
        let response = RequestListResponse {
            success: true,
            data: vec![],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"success":true,"data":[]}"#);
    }

    #[test]
    fn test_request_response_camel_case() {
        let response = MemberRequestResponse {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: "Ada Lovelace".to_string(),
            email: "ada@club.example".to_string(),
            phone_number: "1234567890".to_string(),
            role: Role::Member,
            status: RequestStatus::Pending,
            submitted_at: Utc::now(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("fullName"));
        assert!(json.contains("phoneNumber"));
        assert!(json.contains("submittedAt"));
    }
}
