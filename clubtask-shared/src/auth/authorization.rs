/// Role-based authorization gate
///
/// Every privileged handler asks one question: may this role perform this
/// operation? The answer lives in a single table here, so the split
/// between admin roles (`core-member`, `head-of-dept`) and plain members
/// is auditable in one place instead of scattered across route handlers.
///
/// Role comes from the freshly loaded user row, not from the JWT claim,
/// so demotions take effect on the next request.
///
/// # Example
///
/// ```
/// use clubtask_shared::auth::authorization::{require, Operation};
/// use clubtask_shared::models::Role;
///
/// assert!(require(Role::HeadOfDept, Operation::CreateTask).is_ok());
/// assert!(require(Role::Member, Operation::CreateTask).is_err());
/// assert!(require(Role::Member, Operation::AcceptTask).is_ok());
/// ```

use crate::models::Role;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Role may not perform the operation
    #[error("Role {role} is not permitted to {operation}")]
    Denied {
        role: &'static str,
        operation: &'static str,
    },
}

/// Privileged operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a task and assign it to a member
    CreateTask,

    /// List every task across all users
    ListAllTasks,

    /// List tasks the caller created
    ListCreatedTasks,

    /// Force a task into an arbitrary status
    OverrideTaskStatus,

    /// List, approve and reject membership requests
    HandleMemberRequests,

    /// Enumerate assignable users
    ListAssignees,

    /// Accept an assigned task
    AcceptTask,

    /// Reject an assigned task
    RejectTask,

    /// Complete an assigned task
    CompleteTask,

    /// List the caller's own tasks
    ListOwnTasks,

    /// View and edit the caller's own profile
    UpdateProfile,

    /// Change the caller's own password
    ChangePassword,
}

impl Operation {
    /// Gets the operation name used in denial messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateTask => "create tasks",
            Operation::ListAllTasks => "list all tasks",
            Operation::ListCreatedTasks => "list created tasks",
            Operation::OverrideTaskStatus => "override task status",
            Operation::HandleMemberRequests => "handle member requests",
            Operation::ListAssignees => "list assignees",
            Operation::AcceptTask => "accept tasks",
            Operation::RejectTask => "reject tasks",
            Operation::CompleteTask => "complete tasks",
            Operation::ListOwnTasks => "list own tasks",
            Operation::UpdateProfile => "update profile",
            Operation::ChangePassword => "change password",
        }
    }
}

/// Checks whether a role may perform an operation
pub fn can(role: Role, operation: Operation) -> bool {
    match operation {
        // Admin-only operations
        Operation::CreateTask
        | Operation::ListAllTasks
        | Operation::ListCreatedTasks
        | Operation::OverrideTaskStatus
        | Operation::HandleMemberRequests
        | Operation::ListAssignees => role.is_admin(),

        // Every approved member, admins included
        Operation::AcceptTask
        | Operation::RejectTask
        | Operation::CompleteTask
        | Operation::ListOwnTasks
        | Operation::UpdateProfile
        | Operation::ChangePassword => true,
    }
}

/// Requires that a role may perform an operation
///
/// # Errors
///
/// Returns `AuthzError::Denied` when the role is not permitted.
pub fn require(role: Role, operation: Operation) -> Result<(), AuthzError> {
    if !can(role, operation) {
        return Err(AuthzError::Denied {
            role: role.as_str(),
            operation: operation.as_str(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_OPS: [Operation; 6] = [
        Operation::CreateTask,
        Operation::ListAllTasks,
        Operation::ListCreatedTasks,
        Operation::OverrideTaskStatus,
        Operation::HandleMemberRequests,
        Operation::ListAssignees,
    ];

    const MEMBER_OPS: [Operation; 6] = [
        Operation::AcceptTask,
        Operation::RejectTask,
        Operation::CompleteTask,
        Operation::ListOwnTasks,
        Operation::UpdateProfile,
        Operation::ChangePassword,
    ];

    #[test]
    fn test_members_cannot_perform_admin_operations() {
        for op in ADMIN_OPS {
            assert!(!can(Role::Member, op), "member should not {}", op.as_str());
        }
    }

    #[test]
    fn test_admin_roles_can_perform_admin_operations() {
        for op in ADMIN_OPS {
            assert!(can(Role::CoreMember, op));
            assert!(can(Role::HeadOfDept, op));
        }
    }

    #[test]
    fn test_member_operations_open_to_all_roles() {
        for op in MEMBER_OPS {
            assert!(can(Role::Member, op));
            assert!(can(Role::CoreMember, op));
            assert!(can(Role::HeadOfDept, op));
        }
    }

    #[test]
    fn test_require_denied_names_role_and_operation() {
        let err = require(Role::Member, Operation::CreateTask).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("member"));
        assert!(message.contains("create tasks"));
    }
}
