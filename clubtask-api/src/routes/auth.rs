/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/signup` - Apply for membership (account starts unapproved)
/// - `POST /auth/login` - Sign in and get a 7-day session token
///
/// Signing up does not grant access: the account is created with
/// `accepted = false` alongside a pending member request, and login keeps
/// answering 403 until an admin approves the request.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::users::UserResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use clubtask_shared::{
    auth::{jwt, password},
    models::{CreateUser, MemberRequest, Role, User},
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Validates a phone number: optional leading `+`, then 10-15 digits
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);

    if digits.len() < 10 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        let mut error = ValidationError::new("phone");
        error.message = Some(Cow::Borrowed("Invalid phone number"));
        return Err(error);
    }

    Ok(())
}

/// Signup request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Full name
    #[validate(length(min = 2, max = 50, message = "Name must be 2-50 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Phone number
    #[validate(custom(function = validate_phone))]
    pub phone: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Requested role (defaults to member)
    pub role: Option<Role>,

    /// Branch of study
    pub branch: Option<String>,

    /// Year of study
    pub year: Option<String>,

    /// Section
    pub section: Option<String>,

    /// Department within the club
    pub department: Option<String>,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// Confirmation message
    pub message: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Confirmation message
    pub message: String,

    /// Session token (7 days)
    pub token: String,

    /// Signed-in user
    pub user: UserResponse,
}

/// Apply for membership
///
/// Creates the user account (locked until approval) and opens a pending
/// member request for the admins to decide on.
///
/// # Endpoint
///
/// ```text
/// POST /auth/signup
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@club.example",
///   "phone": "+911234567890",
///   "password": "secret123",
///   "department": "technical"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or email/phone already in use
/// - `403 Forbidden`: A prior request for this email was rejected
/// - `500 Internal Server Error`: Server error
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    req.validate()?;

    // A rejected applicant cannot simply re-apply: the rejection record
    // stands until an admin clears it by approving the rejected request.
    if MemberRequest::find_rejected_by_email(&state.db, &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::ApprovalRejected);
    }

    let password_hash = password::hash_password(&req.password)?;

    // A duplicate email or phone fails here with a unique violation,
    // which the error layer reports as a conflict.
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            phone: req.phone,
            password_hash,
            role: req.role.unwrap_or_default(),
            branch: req.branch.unwrap_or_default(),
            year: req.year.unwrap_or_default(),
            section: req.section.unwrap_or_default(),
            department: req.department.unwrap_or_default(),
        },
    )
    .await?;

    MemberRequest::create(&state.db, &user).await?;

    tracing::info!(user_id = %user.id, "New membership request submitted");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Request submitted. You will be able to sign in once approved.".to_string(),
        }),
    ))
}

/// Sign in
///
/// Verifies credentials, then checks the membership decision before
/// issuing a session token.
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@club.example",
///   "password": "secret123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Login successful",
///   "token": "eyJ...",
///   "user": { "id": "uuid", "name": "Ada Lovelace", ... }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or wrong password
/// - `403 Forbidden`: Membership pending or rejected, or account inactive
/// - `404 Not Found`: No account with that email
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = match User::find_by_email(&state.db, &req.email).await? {
        Some(user) => user,
        None => {
            // A rejected applicant's user row is gone; surface the
            // decision instead of a generic not-found.
            if MemberRequest::find_rejected_by_email(&state.db, &req.email)
                .await?
                .is_some()
            {
                return Err(ApiError::ApprovalRejected);
            }
            return Err(ApiError::NotFound("User not found".to_string()));
        }
    };

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    }

    if !user.accepted {
        // Self-heals a missing request row so the application is never
        // stuck invisible to admins.
        if MemberRequest::find_pending_by_user(&state.db, user.id)
            .await?
            .is_none()
        {
            MemberRequest::create(&state.db, &user).await?;
        }
        return Err(ApiError::ApprovalPending);
    }

    if !user.is_active {
        return Err(ApiError::Forbidden(
            "Account has been deactivated".to_string(),
        ));
    }

    let claims = jwt::Claims::new(user.id, user.email.clone(), user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: UserResponse::from(user),
    }))
}
