/// Profile and account endpoints
///
/// # Endpoints
///
/// - `GET  /users/me` - Current user's profile
/// - `PUT  /users/me` - Update profile fields
/// - `PUT  /users/change-password` - Replace the password
/// - `GET  /users/assignees` - Assignable members (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use clubtask_shared::{
    auth::{
        authorization::{require, Operation},
        middleware::AuthContext,
        password,
    },
    models::{Role, UpdateProfile, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User as exposed over the wire
///
/// Never carries the password hash or the internal approval flags'
/// history; clients only see what they can act on.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub branch: String,
    pub year: String,
    pub section: String,
    pub department: String,
    pub email_notifications: bool,
    pub task_reminders: bool,
    pub accepted: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            branch: user.branch,
            year: user.year,
            section: user.section,
            department: user.department,
            email_notifications: user.email_notifications,
            task_reminders: user.task_reminders,
            accepted: user.accepted,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Profile response envelope
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: UserResponse,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be 2-50 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub branch: Option<String>,
    pub year: Option<String>,
    pub section: Option<String>,
    pub department: Option<String>,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,

    pub confirm_new_password: String,
}

/// Message-only response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Assignee list response
#[derive(Debug, Serialize)]
pub struct AssigneesResponse {
    pub success: bool,
    pub total: usize,
    pub users: Vec<UserResponse>,
}

/// Returns the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        data: UserResponse::from(user),
    }))
}

/// Updates the caller's profile
///
/// Only the provided fields are written. A duplicate email lands as a
/// unique violation and is reported as a conflict.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    require(auth.role, Operation::UpdateProfile)?;
    req.validate()?;

    let user = User::update_profile(
        &state.db,
        auth.user_id,
        UpdateProfile {
            name: req.name,
            email: req.email,
            branch: req.branch,
            year: req.year,
            section: req.section,
            department: req.department,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        data: UserResponse::from(user),
    }))
}

/// Replaces the caller's password
///
/// The two password fields must match; the current password is not
/// required because the caller already holds a valid session.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    require(auth.role, Operation::ChangePassword)?;
    req.validate()?;

    if req.new_password != req.confirm_new_password {
        return Err(ApiError::BadRequest("Passwords do not match".to_string()));
    }

    let password_hash = password::hash_password(&req.new_password)?;

    let updated = User::update_password(&state.db, auth.user_id, &password_hash).await?;
    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, "Password changed");

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

/// Lists assignable members for task creation
///
/// Admin only. A head-of-dept sees only their own department; core
/// members see everyone. The caller is excluded from the list.
pub async fn list_assignees(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<AssigneesResponse>> {
    require(auth.role, Operation::ListAssignees)?;

    let department = if auth.role == Role::HeadOfDept {
        let caller = User::find_by_id(&state.db, auth.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        Some(caller.department)
    } else {
        None
    };

    let users = User::list_assignees(&state.db, auth.user_id, department.as_deref()).await?;

    Ok(Json(AssigneesResponse {
        success: true,
        total: users.len(),
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_password_request_validation() {
        let req = ChangePasswordRequest {
            new_password: "short".to_string(),
            confirm_new_password: "short".to_string(),
        };
        assert!(req.validate().is_err());

        let req = ChangePasswordRequest {
            new_password: "longenough".to_string(),
            confirm_new_password: "longenough".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_profile_request_partial() {
        let req = UpdateProfileRequest {
            name: None,
            email: None,
            branch: Some("ECE".to_string()),
            year: None,
            section: None,
            department: None,
        };
        assert!(req.validate().is_ok());

        let req = UpdateProfileRequest {
            name: Some("A".to_string()),
            email: Some("bad-email".to_string()),
            branch: None,
            year: None,
            section: None,
            department: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_user_response_camel_case() {
        let user = UserResponse {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@club.example".to_string(),
            phone: "1234567890".to_string(),
            role: Role::Member,
            branch: String::new(),
            year: String::new(),
            section: String::new(),
            department: String::new(),
            email_notifications: true,
            task_reminders: true,
            accepted: true,
            is_active: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("emailNotifications"));
        assert!(json.contains("taskReminders"));
        assert!(json.contains("isActive"));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("password"));
    }
}
