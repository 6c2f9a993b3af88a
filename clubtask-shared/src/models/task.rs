/// Task model and the task lifecycle state machine
///
/// Tasks are created by an admin in `available` and move through an explicit
/// transition table:
///
/// ```text
///          create                accept                 complete
/// (none) -------> available --------------> ongoing ----------------> completed
///                     |                        |                      (terminal)
///                     | reject                 | reject
///                     v                        v
///                 rejected (terminal, reason required)
/// ```
///
/// Member transitions are single conditional UPDATEs keyed on the expected
/// prior status, so two concurrent `accept` calls cannot both succeed.
/// `overdue` exists in the schema but nothing transitions into it except the
/// admin override; there is no scheduler.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM (
///     'available', 'ongoing', 'completed', 'rejected', 'overdue'
/// );
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(500) NOT NULL,
///     assigned_to VARCHAR(100) NOT NULL,
///     assigned_to_user UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     deadline TIMESTAMPTZ NOT NULL,
///     status task_status NOT NULL DEFAULT 'available',
///     rejection_reason VARCHAR(200),
///     accepted_at TIMESTAMPTZ,
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created and waiting for the assignee to accept
    Available,

    /// Accepted by the assignee, in progress
    Ongoing,

    /// Finished by the assignee (terminal)
    Completed,

    /// Declined by the assignee, reason recorded (terminal)
    Rejected,

    /// Past deadline; only reachable via the admin override
    Overdue,
}

impl TaskStatus {
    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Available => "available",
            TaskStatus::Ongoing => "ongoing",
            TaskStatus::Completed => "completed",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Overdue => "overdue",
        }
    }

    /// Checks if this status is terminal for the assignee
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Rejected)
    }

    /// Checks if a member-initiated transition to `target` is allowed
    ///
    /// This is the authoritative transition table; out-of-table calls are
    /// refused with a conflict at the HTTP boundary. The admin override
    /// deliberately bypasses this table.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match (self, target) {
            (TaskStatus::Available, TaskStatus::Ongoing) => true,
            (TaskStatus::Available, TaskStatus::Rejected) => true,
            (TaskStatus::Ongoing, TaskStatus::Rejected) => true,
            (TaskStatus::Ongoing, TaskStatus::Completed) => true,
            _ => false,
        }
    }
}

/// Identifies a task in a member transition request
///
/// The wire contract prefers the task's unique ID. Title lookup is retained
/// as a compatibility shim for older clients; it is ambiguous when a user
/// has two tasks with the same title, in which case the newest one wins.
#[derive(Debug, Clone)]
pub enum TaskKey {
    Id(Uuid),
    Title(String),
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title (3-100 chars)
    pub title: String,

    /// Task description (10-500 chars)
    pub description: String,

    /// Free-text assignee label as entered by the creator
    pub assigned_to: String,

    /// Authoritative assignee reference
    pub assigned_to_user: Uuid,

    /// Admin who created the task
    pub created_by: Uuid,

    /// Deadline, validated strictly future at creation only
    pub deadline: DateTime<Utc>,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Reason given by the assignee; set iff status is `rejected`
    pub rejection_reason: Option<String>,

    /// When the assignee accepted the task
    pub accepted_at: Option<DateTime<Utc>>,

    /// When the assignee completed the task
    pub completed_at: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    /// Free-text label, already resolved to `assigned_to_user`
    pub assigned_to: String,
    pub assigned_to_user: Uuid,
    pub created_by: Uuid,
    pub deadline: DateTime<Utc>,
}

const TASK_COLUMNS: &str = "id, title, description, assigned_to, assigned_to_user, created_by, \
     deadline, status, rejection_reason, accepted_at, completed_at, created_at, updated_at";

impl Task {
    /// Creates a new task in `available` status
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, assigned_to, assigned_to_user, created_by, deadline)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(data.assigned_to_user)
        .bind(data.created_by)
        .bind(data.deadline)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds the task a member transition refers to, scoped to the assignee
    ///
    /// Used to distinguish "no such task" from "task in the wrong state"
    /// after a conditional transition touched zero rows.
    pub async fn find_for_assignee(
        pool: &PgPool,
        key: &TaskKey,
        assignee: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = match key {
            TaskKey::Id(id) => {
                sqlx::query_as::<_, Task>(&format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND assigned_to_user = $2",
                ))
                .bind(id)
                .bind(assignee)
                .fetch_optional(pool)
                .await?
            }
            TaskKey::Title(title) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    SELECT {TASK_COLUMNS}
                    FROM tasks
                    WHERE title = $1 AND assigned_to_user = $2
                    ORDER BY created_at DESC, id DESC
                    LIMIT 1
                    "#,
                ))
                .bind(title)
                .bind(assignee)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(task)
    }

    /// Accepts an available task: `available -> ongoing`, stamps `accepted_at`
    ///
    /// The status check and the write are one conditional UPDATE; `None`
    /// means the task does not exist, is not assigned to this user, or is
    /// not `available` (callers do not distinguish these on purpose).
    pub async fn accept(
        pool: &PgPool,
        key: &TaskKey,
        assignee: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = match key {
            TaskKey::Id(id) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    UPDATE tasks
                    SET status = 'ongoing', accepted_at = NOW(), updated_at = NOW()
                    WHERE id = $1 AND assigned_to_user = $2 AND status = 'available'
                    RETURNING {TASK_COLUMNS}
                    "#,
                ))
                .bind(id)
                .bind(assignee)
                .fetch_optional(pool)
                .await?
            }
            TaskKey::Title(title) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    UPDATE tasks
                    SET status = 'ongoing', accepted_at = NOW(), updated_at = NOW()
                    WHERE id = (
                        SELECT id FROM tasks
                        WHERE title = $1 AND assigned_to_user = $2 AND status = 'available'
                        ORDER BY created_at DESC, id DESC
                        LIMIT 1
                    )
                    RETURNING {TASK_COLUMNS}
                    "#,
                ))
                .bind(title)
                .bind(assignee)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(task)
    }

    /// Rejects a task: `available|ongoing -> rejected`, stores the reason
    ///
    /// `None` means no row matched the key, assignee and expected statuses.
    pub async fn reject(
        pool: &PgPool,
        key: &TaskKey,
        assignee: Uuid,
        reason: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = match key {
            TaskKey::Id(id) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    UPDATE tasks
                    SET status = 'rejected', rejection_reason = $3, updated_at = NOW()
                    WHERE id = $1 AND assigned_to_user = $2
                      AND status IN ('available', 'ongoing')
                    RETURNING {TASK_COLUMNS}
                    "#,
                ))
                .bind(id)
                .bind(assignee)
                .bind(reason)
                .fetch_optional(pool)
                .await?
            }
            TaskKey::Title(title) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    UPDATE tasks
                    SET status = 'rejected', rejection_reason = $3, updated_at = NOW()
                    WHERE id = (
                        SELECT id FROM tasks
                        WHERE title = $1 AND assigned_to_user = $2
                          AND status IN ('available', 'ongoing')
                        ORDER BY created_at DESC, id DESC
                        LIMIT 1
                    )
                    RETURNING {TASK_COLUMNS}
                    "#,
                ))
                .bind(title)
                .bind(assignee)
                .bind(reason)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(task)
    }

    /// Completes a task: `ongoing -> completed`, stamps `completed_at`
    pub async fn complete(
        pool: &PgPool,
        key: &TaskKey,
        assignee: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = match key {
            TaskKey::Id(id) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    UPDATE tasks
                    SET status = 'completed', completed_at = NOW(), updated_at = NOW()
                    WHERE id = $1 AND assigned_to_user = $2 AND status = 'ongoing'
                    RETURNING {TASK_COLUMNS}
                    "#,
                ))
                .bind(id)
                .bind(assignee)
                .fetch_optional(pool)
                .await?
            }
            TaskKey::Title(title) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    UPDATE tasks
                    SET status = 'completed', completed_at = NOW(), updated_at = NOW()
                    WHERE id = (
                        SELECT id FROM tasks
                        WHERE title = $1 AND assigned_to_user = $2 AND status = 'ongoing'
                        ORDER BY created_at DESC, id DESC
                        LIMIT 1
                    )
                    RETURNING {TASK_COLUMNS}
                    "#,
                ))
                .bind(title)
                .bind(assignee)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(task)
    }

    /// Administrative status override, bypassing the transition table
    ///
    /// Kept as an explicit escape hatch for correcting stuck tasks; callers
    /// are expected to audit-log the change. Stamps `completed_at` when the
    /// target status is `completed`.
    pub async fn override_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $2,
                completed_at = CASE WHEN $2 = 'completed'::task_status THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks assigned to a user with a given status, newest first
    pub async fn list_for_assignee_by_status(
        pool: &PgPool,
        assignee: Uuid,
        status: TaskStatus,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE assigned_to_user = $1 AND status = $2
            ORDER BY created_at DESC, id DESC
            "#,
        ))
        .bind(assignee)
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists a user's tasks that have left the available state, newest first
    ///
    /// Backs the `status=all` filter, which means "tasks I have acted on"
    /// rather than literally every assignment.
    pub async fn list_started_for_assignee(
        pool: &PgPool,
        assignee: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE assigned_to_user = $1 AND status <> 'available'
            ORDER BY created_at DESC, id DESC
            "#,
        ))
        .bind(assignee)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists all tasks assigned to a user regardless of status, newest first
    pub async fn list_for_assignee(pool: &PgPool, assignee: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE assigned_to_user = $1
            ORDER BY created_at DESC, id DESC
            "#,
        ))
        .bind(assignee)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists every task across all users (admin view), newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC",
        ))
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks created by a given admin, newest first
    pub async fn list_created_by(pool: &PgPool, creator: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE created_by = $1
            ORDER BY created_at DESC, id DESC
            "#,
        ))
        .bind(creator)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Available.as_str(), "available");
        assert_eq!(TaskStatus::Ongoing.as_str(), "ongoing");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Rejected.as_str(), "rejected");
        assert_eq!(TaskStatus::Overdue.as_str(), "overdue");
    }

    #[test]
    fn test_task_status_is_terminal() {
        assert!(!TaskStatus::Available.is_terminal());
        assert!(!TaskStatus::Ongoing.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_transition_table() {
        // Accept
        assert!(TaskStatus::Available.can_transition_to(TaskStatus::Ongoing));

        // Reject from either live state
        assert!(TaskStatus::Available.can_transition_to(TaskStatus::Rejected));
        assert!(TaskStatus::Ongoing.can_transition_to(TaskStatus::Rejected));

        // Complete only from ongoing
        assert!(TaskStatus::Ongoing.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Available.can_transition_to(TaskStatus::Completed));
    }

    #[test]
    fn test_terminal_states_cannot_transition() {
        for target in [
            TaskStatus::Available,
            TaskStatus::Ongoing,
            TaskStatus::Completed,
            TaskStatus::Rejected,
            TaskStatus::Overdue,
        ] {
            assert!(!TaskStatus::Completed.can_transition_to(target));
            assert!(!TaskStatus::Rejected.can_transition_to(target));
        }
    }

    #[test]
    fn test_nothing_transitions_into_overdue() {
        for from in [
            TaskStatus::Available,
            TaskStatus::Ongoing,
            TaskStatus::Completed,
            TaskStatus::Rejected,
        ] {
            assert!(!from.can_transition_to(TaskStatus::Overdue));
        }
    }

    #[test]
    fn test_task_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Available).unwrap(),
            "\"available\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"ongoing\"").unwrap(),
            TaskStatus::Ongoing
        );
    }
}
