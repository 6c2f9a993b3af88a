/// Authentication middleware for Axum
///
/// Validates `Authorization: Bearer <token>` headers, reloads the user
/// row, and re-checks membership approval before exposing an
/// `AuthContext` in request extensions.
///
/// The token is only a pointer to the user: role and approval state come
/// from the database on every request, so revoking a membership or
/// demoting a role does not have to wait out a 7-day token.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, routing::get, Extension, Router};
/// use clubtask_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
/// use sqlx::PgPool;
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.email)
/// }
///
/// fn router(pool: PgPool) -> Router {
///     let secret = "your-jwt-secret".to_string();
///     Router::new()
///         .route("/protected", get(protected_handler))
///         .layer(middleware::from_fn(move |req: Request, next: Next| {
///             jwt_auth_middleware(pool.clone(), secret.clone(), req, next)
///         }))
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::{Role, User};

/// Authentication context added to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor. The role here
/// is the current database role, not the token's snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// User email
    pub email: String,

    /// Current role, reloaded from the database
    pub role: Role,
}

impl AuthContext {
    /// Creates auth context from a freshly loaded user row
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token is valid but the user no longer exists
    UserGone,

    /// Membership request not yet approved
    ApprovalPending,

    /// Account has been deactivated
    AccountInactive,

    /// Database error
    DatabaseError(String),
}

impl AuthError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "Missing credentials".to_string(),
            ),
            AuthError::InvalidFormat(msg) => {
                (StatusCode::BAD_REQUEST, "authentication_error", msg.clone())
            }
            AuthError::InvalidToken(msg) => {
                (StatusCode::UNAUTHORIZED, "authentication_error", msg.clone())
            }
            AuthError::UserGone => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "User not found".to_string(),
            ),
            AuthError::ApprovalPending => (
                StatusCode::FORBIDDEN,
                "approval_pending",
                "Membership request is still pending approval".to_string(),
            ),
            AuthError::AccountInactive => (
                StatusCode::FORBIDDEN,
                "account_inactive",
                "Account has been deactivated".to_string(),
            ),
            AuthError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::DatabaseError(msg) = &self {
            tracing::error!(error = %msg, "Authentication database error");
        }

        let (status, error, message) = self.parts();
        let body = Json(json!({
            "error": error,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// JWT authentication middleware
///
/// Validates the bearer token, reloads the user, and rejects callers
/// whose membership is still pending or whose account was deactivated.
/// On success an [`AuthContext`] is inserted into request extensions.
pub async fn jwt_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    // Rejected users are deleted, so a stale token lands here as UserGone
    let user = User::find_by_id(&pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UserGone)?;

    if !user.accepted {
        return Err(AuthError::ApprovalPending);
    }

    if !user.is_active {
        return Err(AuthError::AccountInactive);
    }

    req.extensions_mut().insert(AuthContext::from_user(&user));

    Ok(next.run(req).await)
}
