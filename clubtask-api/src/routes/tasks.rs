/// Task lifecycle endpoints
///
/// # Endpoints
///
/// Member-facing:
/// - `GET /tasks/available` - Assigned tasks waiting for acceptance
/// - `GET /tasks/ongoing` - Accepted tasks in progress
/// - `GET /tasks/my` - All of the caller's tasks
/// - `GET /tasks/status?status=` - Caller's tasks filtered by status
/// - `PUT /tasks/accept` - available -> ongoing
/// - `PUT /tasks/reject` - available|ongoing -> rejected (reason required)
/// - `PUT /tasks/complete` - ongoing -> completed
///
/// Admin-facing:
/// - `POST /tasks/create` - Create and assign a task
/// - `GET /tasks/head/assigned` - Tasks the caller created
/// - `GET /tasks/admin/all` - Every task in the system
/// - `PUT /tasks/admin/status` - Forced status override (audited)
///
/// Transition requests identify the task by `id`; `title` is accepted as
/// a fallback for older clients and resolves to the caller's newest
/// matching task.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use clubtask_shared::{
    auth::{
        authorization::{require, Operation},
        middleware::AuthContext,
    },
    models::{CreateTask, Task, TaskKey, TaskStatus, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Task as exposed over the wire
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub assigned_to_user: Uuid,
    pub created_by: Uuid,
    pub deadline: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            assigned_to: task.assigned_to,
            assigned_to_user: task.assigned_to_user,
            created_by: task.created_by,
            deadline: task.deadline,
            status: task.status,
            rejection_reason: task.rejection_reason,
            accepted_at: task.accepted_at,
            completed_at: task.completed_at,
            created_at: task.created_at,
        }
    }
}

/// Task creation request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 3, max = 100, message = "Title must be 3-100 characters"))]
    pub title: String,

    #[validate(length(min = 10, max = 500, message = "Description must be 10-500 characters"))]
    pub description: String,

    /// Assignee email, or a partial name
    #[validate(length(min = 1, message = "Assignee is required"))]
    pub assigned_to: String,

    pub deadline: DateTime<Utc>,
}

/// Identifies the task a transition applies to
///
/// `id` wins when both are present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: Option<Uuid>,
    pub title: Option<String>,
}

impl TaskRef {
    fn into_key(self) -> Result<TaskKey, ApiError> {
        if let Some(id) = self.id {
            return Ok(TaskKey::Id(id));
        }
        match self.title {
            Some(title) if !title.trim().is_empty() => Ok(TaskKey::Title(title)),
            _ => Err(ApiError::BadRequest(
                "Task id (or title) is required".to_string(),
            )),
        }
    }
}

/// Task rejection request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectTaskRequest {
    #[serde(flatten)]
    pub task: TaskRef,

    pub reason: Option<String>,
}

/// Admin status override request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideStatusRequest {
    pub id: Uuid,
    pub status: TaskStatus,
}

/// Status filter query for `GET /tasks/status`
///
/// `all` is accepted alongside the status names and means every task the
/// caller has already acted on (everything past `available`).
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

/// Parses the `status` query value; `None` stands for `all`
fn parse_status_filter(value: &str) -> Result<Option<TaskStatus>, ApiError> {
    match value {
        "available" => Ok(Some(TaskStatus::Available)),
        "ongoing" => Ok(Some(TaskStatus::Ongoing)),
        "completed" => Ok(Some(TaskStatus::Completed)),
        "rejected" => Ok(Some(TaskStatus::Rejected)),
        "overdue" => Ok(Some(TaskStatus::Overdue)),
        "all" => Ok(None),
        other => Err(ApiError::BadRequest(format!(
            "Unknown status filter: {}",
            other
        ))),
    }
}

/// Task list envelope used by the member-facing list endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub total_tasks: usize,
    pub tasks: Vec<TaskResponse>,
}

/// Task list envelope used by the admin list endpoint
#[derive(Debug, Serialize)]
pub struct AdminTaskListResponse {
    pub success: bool,
    pub total: usize,
    pub tasks: Vec<TaskResponse>,
}

/// Single-task envelope for mutations
#[derive(Debug, Serialize)]
pub struct TaskMutationResponse {
    pub message: String,
    pub task: TaskResponse,
}

fn task_list(tasks: Vec<Task>) -> TaskListResponse {
    TaskListResponse {
        total_tasks: tasks.len(),
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
    }
}

/// Creates a task and assigns it to a member
///
/// Admin only. The assignee is resolved by exact email first, then by a
/// case-insensitive partial name match among approved users.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskMutationResponse>)> {
    require(auth.role, Operation::CreateTask)?;
    req.validate()?;

    if req.deadline <= Utc::now() {
        return Err(ApiError::BadRequest(
            "Deadline must be in the future".to_string(),
        ));
    }

    let assignee = User::resolve_assignee(&state.db, &req.assigned_to)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignee not found".to_string()))?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            assigned_to: req.assigned_to,
            assigned_to_user: assignee.id,
            created_by: auth.user_id,
            deadline: req.deadline,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, assignee = %assignee.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskMutationResponse {
            message: "Task created successfully".to_string(),
            task: TaskResponse::from(task),
        }),
    ))
}

/// Lists the caller's tasks waiting for acceptance
pub async fn available_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks =
        Task::list_for_assignee_by_status(&state.db, auth.user_id, TaskStatus::Available).await?;
    Ok(Json(task_list(tasks)))
}

/// Lists the caller's tasks in progress
pub async fn ongoing_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks =
        Task::list_for_assignee_by_status(&state.db, auth.user_id, TaskStatus::Ongoing).await?;
    Ok(Json(task_list(tasks)))
}

/// Lists all of the caller's tasks regardless of status
pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskListResponse>> {
    require(auth.role, Operation::ListOwnTasks)?;

    let tasks = Task::list_for_assignee(&state.db, auth.user_id).await?;
    Ok(Json(task_list(tasks)))
}

/// Lists the caller's tasks filtered by an arbitrary status
pub async fn tasks_by_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = match parse_status_filter(&query.status)? {
        Some(status) => {
            Task::list_for_assignee_by_status(&state.db, auth.user_id, status).await?
        }
        None => Task::list_started_for_assignee(&state.db, auth.user_id).await?,
    };
    Ok(Json(task_list(tasks)))
}

/// Accepts an available task
///
/// The status check and the write are one conditional update, so two
/// concurrent accepts cannot both succeed; the loser sees 404.
pub async fn accept_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<TaskRef>,
) -> ApiResult<Json<TaskMutationResponse>> {
    require(auth.role, Operation::AcceptTask)?;
    let key = req.into_key()?;

    let task = Task::accept(&state.db, &key, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found or not available".to_string()))?;

    Ok(Json(TaskMutationResponse {
        message: "Task accepted".to_string(),
        task: TaskResponse::from(task),
    }))
}

/// Rejects a task with a reason
///
/// Allowed from `available` or `ongoing`. A task already in a terminal
/// state is a conflict, not a repeatable operation.
pub async fn reject_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RejectTaskRequest>,
) -> ApiResult<Json<TaskMutationResponse>> {
    require(auth.role, Operation::RejectTask)?;

    let reason = req
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Rejection reason is required".to_string()))?;

    if reason.len() > 200 {
        return Err(ApiError::BadRequest(
            "Rejection reason must be at most 200 characters".to_string(),
        ));
    }

    let key = req.task.into_key()?;

    match Task::reject(&state.db, &key, auth.user_id, reason).await? {
        Some(task) => Ok(Json(TaskMutationResponse {
            message: "Task rejected".to_string(),
            task: TaskResponse::from(task),
        })),
        None => match Task::find_for_assignee(&state.db, &key, auth.user_id).await? {
            Some(task) => Err(ApiError::Conflict(format!(
                "Task is already {}",
                task.status.as_str()
            ))),
            None => Err(ApiError::NotFound("Task not found".to_string())),
        },
    }
}

/// Completes an ongoing task
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<TaskRef>,
) -> ApiResult<Json<TaskMutationResponse>> {
    require(auth.role, Operation::CompleteTask)?;
    let key = req.into_key()?;

    match Task::complete(&state.db, &key, auth.user_id).await? {
        Some(task) => Ok(Json(TaskMutationResponse {
            message: "Task completed".to_string(),
            task: TaskResponse::from(task),
        })),
        None => match Task::find_for_assignee(&state.db, &key, auth.user_id).await? {
            Some(task) if task.status == TaskStatus::Available => Err(ApiError::Conflict(
                "Task has not been accepted yet".to_string(),
            )),
            Some(task) => Err(ApiError::Conflict(format!(
                "Task is already {}",
                task.status.as_str()
            ))),
            None => Err(ApiError::NotFound("Task not found".to_string())),
        },
    }
}

/// Lists tasks created by the calling admin
pub async fn created_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskListResponse>> {
    require(auth.role, Operation::ListCreatedTasks)?;

    let tasks = Task::list_created_by(&state.db, auth.user_id).await?;
    Ok(Json(task_list(tasks)))
}

/// Lists every task in the system
pub async fn all_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<AdminTaskListResponse>> {
    require(auth.role, Operation::ListAllTasks)?;

    let tasks = Task::list_all(&state.db).await?;
    Ok(Json(AdminTaskListResponse {
        success: true,
        total: tasks.len(),
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
    }))
}

/// Forces a task into an arbitrary status
///
/// Bypasses the transition table on purpose; this is the escape hatch
/// for correcting stuck or mis-handled tasks, and every use is logged.
pub async fn override_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<OverrideStatusRequest>,
) -> ApiResult<Json<TaskMutationResponse>> {
    require(auth.role, Operation::OverrideTaskStatus)?;

    let task = Task::override_status(&state.db, req.id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::warn!(
        task_id = %task.id,
        new_status = req.status.as_str(),
        admin = %auth.user_id,
        "Task status overridden by admin"
    );

    Ok(Json(TaskMutationResponse {
        message: "Task status updated".to_string(),
        task: TaskResponse::from(task),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_accepts_all() {
        assert!(matches!(
            parse_status_filter("ongoing"),
            Ok(Some(TaskStatus::Ongoing))
        ));
        assert!(matches!(parse_status_filter("all"), Ok(None)));
        assert!(matches!(
            parse_status_filter("started"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_task_ref_prefers_id() {
        let id = Uuid::new_v4();
        let task_ref = TaskRef {
            id: Some(id),
            title: Some("ignored".to_string()),
        };
        assert!(matches!(task_ref.into_key(), Ok(TaskKey::Id(k)) if k == id));
    }

    #[test]
    fn test_task_ref_falls_back_to_title() {
        let task_ref = TaskRef {
            id: None,
            title: Some("Poster design".to_string()),
        };
        assert!(matches!(task_ref.into_key(), Ok(TaskKey::Title(t)) if t == "Poster design"));
    }

    #[test]
    fn test_task_ref_requires_something() {
        let task_ref = TaskRef {
            id: None,
            title: None,
        };
        assert!(task_ref.into_key().is_err());

        let task_ref = TaskRef {
            id: None,
            title: Some("   ".to_string()),
        };
        assert!(task_ref.into_key().is_err());
    }

    #[test]
    fn test_create_task_request_validation() {
        let req = CreateTaskRequest {
            title: "ab".to_string(),
            description: "too short".to_string(),
            assigned_to: String::new(),
            deadline: Utc::now(),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("assigned_to"));
    }

    #[test]
    fn test_task_list_envelope_camel_case() {
        let response = TaskListResponse {
            total_tasks: 0,
            tasks: vec![],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("totalTasks"));
    }
}
