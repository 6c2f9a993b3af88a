/// Common test utilities for integration tests
///
/// Shared infrastructure:
/// - Test database setup (migrations run against `DATABASE_URL`)
/// - Approved/pending user creation with hashed passwords
/// - JWT token generation
///
/// These tests require a reachable PostgreSQL database and are marked
/// `#[ignore]`; run them with `cargo test -- --ignored`.

use clubtask_api::app::{build_router, AppState};
use clubtask_api::config::Config;
use clubtask_shared::auth::jwt::{create_token, Claims};
use clubtask_shared::auth::password::hash_password;
use clubtask_shared::models::{CreateUser, MemberRequest, Role, User};
use sqlx::PgPool;
use uuid::Uuid;

/// Default password for users created by the test helpers
pub const TEST_PASSWORD: &str = "secret123";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub admin: User,
    pub admin_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh approved admin user
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations").run(&db).await?;

        let admin = create_user(&db, Role::CoreMember, true).await?;
        let admin_token = token_for(&admin, &config)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            admin,
            admin_token,
        })
    }

    /// Creates an approved member with a session token
    pub async fn member(&self) -> anyhow::Result<(User, String)> {
        let user = create_user(&self.db, Role::Member, true).await?;
        let token = token_for(&user, &self.config)?;
        Ok((user, token))
    }

    /// Returns an authorization header value for a token
    pub fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }
}

/// Creates a user; `approved` controls the accepted/is_active flags
pub async fn create_user(pool: &PgPool, role: Role, approved: bool) -> anyhow::Result<User> {
    let id = Uuid::new_v4();
    let suffix = id.simple().to_string();

    let user = User::create(
        pool,
        CreateUser {
            name: format!("Test User {}", &suffix[..8]),
            email: format!("test-{}@example.com", suffix),
            phone: format!("9{:09}", id.as_u128() % 1_000_000_000),
            password_hash: hash_password(TEST_PASSWORD)?,
            role,
            branch: "CSE".to_string(),
            year: "3".to_string(),
            section: "A".to_string(),
            department: "technical".to_string(),
        },
    )
    .await?;

    if approved {
        sqlx::query("UPDATE users SET accepted = TRUE, is_active = TRUE WHERE id = $1")
            .bind(user.id)
            .execute(pool)
            .await?;

        // Reload to pick up the flags
        return Ok(User::find_by_id(pool, user.id).await?.expect("user exists"));
    }

    MemberRequest::create(pool, &user).await?;
    Ok(user)
}

/// Issues a session token for a user
pub fn token_for(user: &User, config: &Config) -> anyhow::Result<String> {
    let claims = Claims::new(user.id, user.email.clone(), user.role);
    Ok(create_token(&claims, &config.jwt.secret)?)
}
