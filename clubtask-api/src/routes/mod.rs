/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Public signup and login
/// - `users`: Profile, password, and assignee listing
/// - `tasks`: Task lifecycle (create, accept, reject, complete, admin)
/// - `member_requests`: Membership approval workflow

pub mod auth;
pub mod health;
pub mod member_requests;
pub mod tasks;
pub mod users;
