/// User model and database operations
///
/// A user is created at signup with `accepted = false` and becomes usable
/// only after an admin approves the matching member request. Rejection
/// deletes the user outright.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('member', 'core-member', 'head-of-dept');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(50) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     phone VARCHAR(16) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'member',
///     branch TEXT NOT NULL DEFAULT '',
///     year TEXT NOT NULL DEFAULT '',
///     section TEXT NOT NULL DEFAULT '',
///     department TEXT NOT NULL DEFAULT '',
///     email_notifications BOOLEAN NOT NULL DEFAULT TRUE,
///     task_reminders BOOLEAN NOT NULL DEFAULT TRUE,
///     accepted BOOLEAN NOT NULL DEFAULT FALSE,
///     is_active BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Club role of a user
///
/// `core-member` and `head-of-dept` are the admin roles: they may create
/// tasks, see all tasks, and resolve member requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Regular club member
    Member,

    /// Core committee member (admin)
    CoreMember,

    /// Head of a department (admin)
    HeadOfDept,
}

impl Role {
    /// Converts role to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::CoreMember => "core-member",
            Role::HeadOfDept => "head-of-dept",
        }
    }

    /// Whether this role counts as an administrator
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::CoreMember | Role::HeadOfDept)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}

/// User model representing a club member account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Full name
    pub name: String,

    /// Email address (case-insensitive via CITEXT), unique
    pub email: String,

    /// Phone number, unique
    pub phone: String,

    /// Argon2id password hash, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Club role
    pub role: Role,

    /// Academic branch
    pub branch: String,

    /// Academic year
    pub year: String,

    /// Class section
    pub section: String,

    /// Club department (used to scope assignee lists for heads)
    pub department: String,

    /// Whether the user opted into email notifications
    pub email_notifications: bool,

    /// Whether the user opted into task deadline reminders
    pub task_reminders: bool,

    /// Whether an admin has approved this account
    ///
    /// Unapproved users can authenticate credential-wise but never receive
    /// a session token.
    pub accepted: bool,

    /// Whether the account is active
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user at signup
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Argon2id hash, not the plaintext password
    pub password_hash: String,
    pub role: Role,
    pub branch: String,
    pub year: String,
    pub section: String,
    pub department: String,
}

/// Input for updating profile fields
///
/// All fields are optional; only `Some` values are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub branch: Option<String>,
    pub year: Option<String>,
    pub section: Option<String>,
    pub department: Option<String>,
}

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, role, branch, year, \
     section, department, email_notifications, task_reminders, accepted, is_active, \
     created_at, updated_at";

impl User {
    /// Creates a new user in the database
    ///
    /// The account starts unapproved (`accepted = false`, `is_active = false`);
    /// the membership approval workflow flips both on approval.
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the email or phone is
    /// already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, phone, password_hash, role, branch, year, section, department)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.branch)
        .bind(data.year)
        .bind(data.section)
        .bind(data.department)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Resolves a task assignee identifier to a user
    ///
    /// The identifier is either an exact email address or a case-insensitive
    /// partial name match. The newest matching account wins when a partial
    /// name is ambiguous.
    pub async fn resolve_assignee(
        pool: &PgPool,
        identifier: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE accepted = TRUE AND (email = $1 OR name ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        ))
        .bind(identifier)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates profile fields; only `Some` values are written
    ///
    /// Returns the updated user, or `None` if the user does not exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        for (present, column) in [
            (data.name.is_some(), "name"),
            (data.email.is_some(), "email"),
            (data.branch.is_some(), "branch"),
            (data.year.is_some(), "year"),
            (data.section.is_some(), "section"),
            (data.department.is_some(), "department"),
        ] {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        for value in [
            data.name,
            data.email,
            data.branch,
            data.year,
            data.section,
            data.department,
        ]
        .into_iter()
        .flatten()
        {
            q = q.bind(value);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Replaces the stored password hash
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists assignee candidates for task creation
    ///
    /// Excludes the calling admin. When `department` is `Some`, only users of
    /// that department are returned (heads-of-dept see only their own).
    pub async fn list_assignees(
        pool: &PgPool,
        exclude: Uuid,
        department: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = match department {
            Some(dept) => {
                sqlx::query_as::<_, User>(&format!(
                    r#"
                    SELECT {USER_COLUMNS}
                    FROM users
                    WHERE id <> $1 AND accepted = TRUE AND department = $2
                    ORDER BY created_at DESC, id DESC
                    "#,
                ))
                .bind(exclude)
                .bind(dept)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    r#"
                    SELECT {USER_COLUMNS}
                    FROM users
                    WHERE id <> $1 AND accepted = TRUE
                    ORDER BY created_at DESC, id DESC
                    "#,
                ))
                .bind(exclude)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Member.as_str(), "member");
        assert_eq!(Role::CoreMember.as_str(), "core-member");
        assert_eq!(Role::HeadOfDept.as_str(), "head-of-dept");
    }

    #[test]
    fn test_role_is_admin() {
        assert!(!Role::Member.is_admin());
        assert!(Role::CoreMember.is_admin());
        assert!(Role::HeadOfDept.is_admin());
    }

    #[test]
    fn test_role_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Role::HeadOfDept).unwrap(),
            "\"head-of-dept\""
        );
        assert_eq!(
            serde_json::from_str::<Role>("\"core-member\"").unwrap(),
            Role::CoreMember
        );
    }

    #[test]
    fn test_default_role_is_member() {
        assert_eq!(Role::default(), Role::Member);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            phone: "+911234567890".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Member,
            branch: String::new(),
            year: String::new(),
            section: String::new(),
            department: String::new(),
            email_notifications: true,
            task_reminders: true,
            accepted: false,
            is_active: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }

    // Integration tests for database operations are in clubtask-api/tests.
}
