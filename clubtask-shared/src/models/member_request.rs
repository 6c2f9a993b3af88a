/// Membership request model and the approval workflow
///
/// Signing up creates a user with `accepted = FALSE` plus a pending
/// member request. An admin then approves (user gains access, request row
/// is removed) or rejects (the user row is deleted, the request is kept
/// as the rejection record). A kept rejection blocks that email from
/// signing up again; approving the rejected record clears the block.
/// A partial unique index on `email WHERE status = 'pending'` guarantees
/// at most one open request per email.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE request_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE member_requests (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL,
///     full_name VARCHAR(50) NOT NULL,
///     email CITEXT NOT NULL,
///     phone_number VARCHAR(16) NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     status request_status NOT NULL DEFAULT 'pending',
///     submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX member_requests_pending_email_idx
///     ON member_requests (email) WHERE status = 'pending';
/// ```
///
/// `user_id` carries no foreign key: rejection deletes the user first and
/// the request row must survive as the audit trail of the decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{Role, User};

/// Membership request decision state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting an admin decision
    Pending,

    /// Approved; the request row is deleted, so this state is transient
    Approved,

    /// Rejected; the user row has been deleted
    Rejected,
}

impl RequestStatus {
    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// Membership request model
///
/// Applicant details are denormalized from the user row so a rejection
/// record stays readable after the user is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberRequest {
    /// Unique request ID
    pub id: Uuid,

    /// The user the request was opened for (no FK, see module docs)
    pub user_id: Uuid,

    /// Applicant name
    pub full_name: String,

    /// Applicant email
    pub email: String,

    /// Applicant phone number
    pub phone_number: String,

    /// Role requested at sign-up
    pub role: Role,

    /// Decision state
    pub status: RequestStatus,

    /// When the request was submitted
    pub submitted_at: DateTime<Utc>,

    /// When the row was created
    pub created_at: DateTime<Utc>,
}

const REQUEST_COLUMNS: &str =
    "id, user_id, full_name, email, phone_number, role, status, submitted_at, created_at";

impl MemberRequest {
    /// Opens a pending request for a freshly signed-up user
    ///
    /// Fails with a unique violation if the email already has a pending
    /// request (the partial index enforces the one-open-request rule).
    pub async fn create(pool: &PgPool, user: &User) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, MemberRequest>(&format!(
            r#"
            INSERT INTO member_requests (user_id, full_name, email, phone_number, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role)
        .fetch_one(pool)
        .await?;

        Ok(request)
    }

    /// Finds a request by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, MemberRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM member_requests WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Finds the open pending request for a user, if any
    pub async fn find_pending_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, MemberRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM member_requests
            WHERE user_id = $1 AND status = 'pending'
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Finds the most recent rejected request for an email
    ///
    /// Keyed by email because rejection deletes the user row, so a
    /// rejected applicant signing in again has no user id to key on.
    pub async fn find_rejected_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, MemberRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM member_requests
            WHERE email = $1 AND status = 'rejected'
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Lists requests, optionally filtered by status, newest first
    pub async fn list(
        pool: &PgPool,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let requests = match status {
            Some(status) => {
                sqlx::query_as::<_, MemberRequest>(&format!(
                    r#"
                    SELECT {REQUEST_COLUMNS}
                    FROM member_requests
                    WHERE status = $1
                    ORDER BY submitted_at DESC, id DESC
                    "#,
                ))
                .bind(status)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MemberRequest>(&format!(
                    r#"
                    SELECT {REQUEST_COLUMNS}
                    FROM member_requests
                    ORDER BY submitted_at DESC, id DESC
                    "#,
                ))
                .fetch_all(pool)
                .await?
            }
        };

        Ok(requests)
    }

    /// Approves a request, in one transaction
    ///
    /// Unlocks the user (`accepted`, `is_active`) and removes the request
    /// row; requests are work items, not history. Deliberately not
    /// restricted to pending rows: approving a rejected request clears
    /// the rejection record, which is what re-admits an applicant whose
    /// email is otherwise blocked from signing up again. Returns `None`
    /// when the request is gone, so a concurrent double-approve is a
    /// clean miss rather than a silent re-run.
    pub async fn approve(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, MemberRequest>(&format!(
            r#"
            DELETE FROM member_requests
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Ok(None);
        };

        // Tolerates a user deleted out-of-band; the request still closes.
        sqlx::query(
            "UPDATE users SET accepted = TRUE, is_active = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(request.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(request))
    }

    /// Rejects a pending request and removes the user, in one transaction
    ///
    /// The user row is deleted before the request flips to `rejected`, so
    /// a crash between the two cannot leave a rejected request alongside
    /// a live login.
    pub async fn reject(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let pending = sqlx::query_as::<_, MemberRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM member_requests WHERE id = $1 AND status = 'pending'",
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(pending) = pending else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(pending.user_id)
            .execute(&mut *tx)
            .await?;

        let request = sqlx::query_as::<_, MemberRequest>(&format!(
            r#"
            UPDATE member_requests
            SET status = 'rejected'
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_as_str() {
        assert_eq!(RequestStatus::Pending.as_str(), "pending");
        assert_eq!(RequestStatus::Approved.as_str(), "approved");
        assert_eq!(RequestStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_request_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<RequestStatus>("\"rejected\"").unwrap(),
            RequestStatus::Rejected
        );
    }
}
