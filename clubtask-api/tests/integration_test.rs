/// Integration tests for the ClubTask API
///
/// End-to-end coverage of the main flows:
/// - Signup -> pending -> approve/reject -> login
/// - Task lifecycle (create -> accept -> complete) with conflict checks
/// - Role enforcement on admin endpoints
///
/// All tests need a reachable PostgreSQL database (`DATABASE_URL`) and a
/// `JWT_SECRET`, so they are `#[ignore]`d by default:
/// `cargo test -- --ignored`.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use clubtask_shared::models::{Role, User};
use common::TestContext;
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

/// Builds a JSON request with an optional bearer token
fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(token) = token {
        builder = builder.header("authorization", TestContext::bearer(token));
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", TestContext::bearer(token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_signup_creates_pending_membership() {
    let mut ctx = TestContext::new().await.unwrap();

    let suffix = Uuid::new_v4().simple().to_string();
    let email = format!("applicant-{}@example.com", suffix);

    let response = ctx
        .app
        .call(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({
                "name": "New Applicant",
                "email": email,
                "phone": format!("8{:09}", Uuid::new_v4().as_u128() % 1_000_000_000),
                "password": "secret123",
                "department": "technical"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    // Login is refused until an admin approves
    let response = ctx
        .app
        .call(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": email, "password": "secret123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "approval_pending");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_approve_unlocks_login() {
    let mut ctx = TestContext::new().await.unwrap();

    let applicant = common::create_user(&ctx.db, Role::Member, false)
        .await
        .unwrap();

    // Find the pending request via the admin endpoint
    let response = ctx
        .app
        .call(get_request("/member-requests", &ctx.admin_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let request_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["userId"] == applicant.id.to_string())
        .map(|r| r["id"].as_str().unwrap().to_string())
        .expect("pending request listed");

    let response = ctx
        .app
        .call(json_request(
            "PUT",
            &format!("/member-requests/{}", request_id),
            Some(&ctx.admin_token),
            json!({ "action": "approve" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Approving twice conflicts
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            &format!("/member-requests/{}", request_id),
            Some(&ctx.admin_token),
            json!({ "action": "approve" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The applicant can now sign in
    let response = ctx
        .app
        .call(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": applicant.email, "password": common::TEST_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], applicant.email);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_reject_deletes_user_and_keeps_record() {
    let mut ctx = TestContext::new().await.unwrap();

    let applicant = common::create_user(&ctx.db, Role::Member, false)
        .await
        .unwrap();
    let request = clubtask_shared::models::MemberRequest::find_pending_by_user(&ctx.db, applicant.id)
        .await
        .unwrap()
        .expect("pending request");

    let response = ctx
        .app
        .call(json_request(
            "PUT",
            &format!("/member-requests/{}", request.id),
            Some(&ctx.admin_token),
            json!({ "action": "reject" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The user row is gone, the request survives as the decision record
    assert!(User::find_by_id(&ctx.db, applicant.id)
        .await
        .unwrap()
        .is_none());

    let response = ctx
        .app
        .call(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": applicant.email, "password": common::TEST_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "approval_rejected");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_rejected_email_blocks_resignup_until_cleared() {
    let mut ctx = TestContext::new().await.unwrap();

    let applicant = common::create_user(&ctx.db, Role::Member, false)
        .await
        .unwrap();
    let request = clubtask_shared::models::MemberRequest::find_pending_by_user(&ctx.db, applicant.id)
        .await
        .unwrap()
        .expect("pending request");

    let response = ctx
        .app
        .call(json_request(
            "PUT",
            &format!("/member-requests/{}", request.id),
            Some(&ctx.admin_token),
            json!({ "action": "reject" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The kept rejection record blocks a fresh signup with the same email
    let signup = json!({
        "name": "Second Attempt",
        "email": applicant.email,
        "phone": format!("7{:09}", Uuid::new_v4().as_u128() % 1_000_000_000),
        "password": "secret123",
        "department": "technical"
    });

    let response = ctx
        .app
        .call(json_request("POST", "/auth/signup", None, signup.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "approval_rejected");

    // An admin approving the rejected request clears the record
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            &format!("/member-requests/{}", request.id),
            Some(&ctx.admin_token),
            json!({ "action": "approve" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The applicant can apply again
    let response = ctx
        .app
        .call(json_request("POST", "/auth/signup", None, signup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_task_lifecycle() {
    let mut ctx = TestContext::new().await.unwrap();
    let (member, member_token) = ctx.member().await.unwrap();

    // Admin creates a task assigned by email
    let response = ctx
        .app
        .call(json_request(
            "POST",
            "/tasks/create",
            Some(&ctx.admin_token),
            json!({
                "title": "Design the event poster",
                "description": "A3 poster for the spring hackathon, deadline friday.",
                "assignedTo": member.email,
                "deadline": (chrono::Utc::now() + chrono::Duration::days(7)).to_rfc3339()
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let task_id = body["task"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["task"]["status"], "available");

    // The member sees it under /tasks/available
    let response = ctx
        .app
        .call(get_request("/tasks/available", &member_token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["totalTasks"], 1);

    // Completing before accepting is a conflict
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            "/tasks/complete",
            Some(&member_token),
            json!({ "id": task_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Accept
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            "/tasks/accept",
            Some(&member_token),
            json!({ "id": task_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["task"]["status"], "ongoing");
    assert!(body["task"]["acceptedAt"].is_string());

    // Accepting again fails: the task is no longer available
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            "/tasks/accept",
            Some(&member_token),
            json!({ "id": task_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Complete
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            "/tasks/complete",
            Some(&member_token),
            json!({ "id": task_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["task"]["status"], "completed");
    assert!(body["task"]["completedAt"].is_string());

    // Completed is terminal; a second complete conflicts
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            "/tasks/complete",
            Some(&member_token),
            json!({ "id": task_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_reject_task_requires_reason() {
    let mut ctx = TestContext::new().await.unwrap();
    let (member, member_token) = ctx.member().await.unwrap();

    let response = ctx
        .app
        .call(json_request(
            "POST",
            "/tasks/create",
            Some(&ctx.admin_token),
            json!({
                "title": "Collect feedback forms",
                "description": "Gather the printed feedback forms after the workshop.",
                "assignedTo": member.email,
                "deadline": (chrono::Utc::now() + chrono::Duration::days(2)).to_rfc3339()
            }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let task_id = body["task"]["id"].as_str().unwrap().to_string();

    // Missing reason
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            "/tasks/reject",
            Some(&member_token),
            json!({ "id": task_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // With a reason the rejection lands and records it
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            "/tasks/reject",
            Some(&member_token),
            json!({ "id": task_id, "reason": "Out of town that week" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["task"]["status"], "rejected");
    assert_eq!(body["task"]["rejectionReason"], "Out of town that week");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_members_cannot_use_admin_endpoints() {
    let mut ctx = TestContext::new().await.unwrap();
    let (_, member_token) = ctx.member().await.unwrap();

    let response = ctx
        .app
        .call(json_request(
            "POST",
            "/tasks/create",
            Some(&member_token),
            json!({
                "title": "Should not work",
                "description": "Members are not allowed to create tasks.",
                "assignedTo": "anyone",
                "deadline": (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339()
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .call(get_request("/member-requests", &member_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .call(get_request("/tasks/admin/all", &member_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_requests_require_token() {
    let mut ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .call(
            Request::builder()
                .method("GET")
                .uri("/tasks/my")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn test_admin_status_override() {
    let mut ctx = TestContext::new().await.unwrap();
    let (member, _) = ctx.member().await.unwrap();

    let response = ctx
        .app
        .call(json_request(
            "POST",
            "/tasks/create",
            Some(&ctx.admin_token),
            json!({
                "title": "Update sponsor deck",
                "description": "Refresh the sponsorship slides with this year's numbers.",
                "assignedTo": member.email,
                "deadline": (chrono::Utc::now() + chrono::Duration::days(3)).to_rfc3339()
            }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let task_id = body["task"]["id"].as_str().unwrap().to_string();

    // Force the task straight to overdue, bypassing the lifecycle
    let response = ctx
        .app
        .call(json_request(
            "PUT",
            "/tasks/admin/status",
            Some(&ctx.admin_token),
            json!({ "id": task_id, "status": "overdue" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["task"]["status"], "overdue");
}
