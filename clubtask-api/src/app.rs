/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with
/// all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use clubtask_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = clubtask_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use clubtask_shared::auth::middleware::{jwt_auth_middleware, AuthError};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// ├── /auth/                        # Public
/// │   ├── POST /signup
/// │   └── POST /login
/// ├── /users/                       # Authenticated
/// │   ├── GET  /me
/// │   ├── PUT  /me
/// │   ├── PUT  /change-password
/// │   └── GET  /assignees           # Admin
/// ├── /tasks/                       # Authenticated
/// │   ├── POST /create              # Admin
/// │   ├── GET  /available|ongoing|my
/// │   ├── GET  /status?status=
/// │   ├── PUT  /accept|reject|complete
/// │   ├── GET  /head/assigned       # Admin
/// │   ├── GET  /admin/all           # Admin
/// │   └── PUT  /admin/status        # Admin
/// └── /member-requests/             # Admin
///     ├── GET  /?status=
///     └── PUT  /:id
/// ```
///
/// Role checks happen inside the handlers via the permission table; the
/// route layer only establishes identity.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login));

    // Profile and account routes
    let user_routes = Router::new()
        .route("/me", get(routes::users::get_profile))
        .route("/me", put(routes::users::update_profile))
        .route("/change-password", put(routes::users::change_password))
        .route("/assignees", get(routes::users::list_assignees));

    // Task lifecycle routes
    let task_routes = Router::new()
        .route("/create", post(routes::tasks::create_task))
        .route("/available", get(routes::tasks::available_tasks))
        .route("/ongoing", get(routes::tasks::ongoing_tasks))
        .route("/my", get(routes::tasks::my_tasks))
        .route("/status", get(routes::tasks::tasks_by_status))
        .route("/accept", put(routes::tasks::accept_task))
        .route("/reject", put(routes::tasks::reject_task))
        .route("/complete", put(routes::tasks::complete_task))
        .route("/head/assigned", get(routes::tasks::created_tasks))
        .route("/admin/all", get(routes::tasks::all_tasks))
        .route("/admin/status", put(routes::tasks::override_task_status));

    // Membership approval routes
    let member_request_routes = Router::new()
        .route("/", get(routes::member_requests::list_requests))
        .route("/:id", put(routes::member_requests::handle_request));

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .nest("/member-requests", member_request_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn(
            crate::middleware::security_headers,
        ))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Thin wrapper binding the shared bearer-token middleware to the app
/// state. Identity, role, and approval state are reloaded per request.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    jwt_auth_middleware(
        state.db.clone(),
        state.config.jwt.secret.clone(),
        req,
        next,
    )
    .await
}
