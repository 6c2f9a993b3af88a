/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: JWT session token generation and validation
/// - [`middleware`]: Axum bearer-token middleware with approval re-checks
/// - [`authorization`]: Role/operation permission table
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HS256 signing, 7-day sessions, no refresh tokens
/// - **Live Re-checks**: Role and approval state reloaded per request
///
/// # Example
///
/// ```no_run
/// use clubtask_shared::auth::jwt::{create_token, Claims};
/// use clubtask_shared::auth::password::{hash_password, verify_password};
/// use clubtask_shared::models::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "ada@club.example", Role::Member);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
