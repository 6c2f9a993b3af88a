pub mod member_request;
pub mod task;
pub mod user;

pub use member_request::{MemberRequest, RequestStatus};
pub use task::{CreateTask, Task, TaskKey, TaskStatus};
pub use user::{CreateUser, Role, UpdateProfile, User};
