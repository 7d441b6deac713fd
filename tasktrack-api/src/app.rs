//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasktrack_api::{app::{build_router, AppState}, config::Config};
//! use tasktrack_shared::db::pool::create_pool;
//! use tasktrack_shared::store::PgStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = create_pool(config.pool_config()).await?;
//! let state = AppState::new(Arc::new(PgStore::new(pool)), config);
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tasktrack_shared::{
    auth::{guard::bearer_auth_middleware, token::TokenService},
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every field
/// is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    /// Token issuance and validation
    pub tokens: Arc<TokenService>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates application state, building the token service from `config`
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenService::new(config.token_config())),
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /                                 # Service info (public)
/// /health                           # Health check (public)
/// /v1/
/// ├── auth/register   POST          # (public)
/// ├── auth/login      POST          # (public)
/// ├── auth/me         GET           # everything below needs a bearer token
/// ├── tasks           GET POST
/// ├── tasks/:id       GET PUT DELETE
/// ├── tasks/:id/complete  PATCH
/// ├── projects        GET POST
/// ├── projects/:id    GET PUT DELETE
/// └── projects/:id/tasks  GET
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing, then the bearer
/// guard on the protected routes only.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/v1/auth/register", post(routes::auth::register))
        .route("/v1/auth/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/v1/auth/me", get(routes::auth::me))
        .route(
            "/v1/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/v1/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/v1/tasks/:id/complete", patch(routes::tasks::complete_task))
        .route(
            "/v1/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/v1/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/v1/projects/:id/tasks", get(routes::projects::project_tasks))
        .layer(axum::middleware::from_fn_with_state(
            state.tokens.clone(),
            bearer_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(routes::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS per configuration: permissive for `*`, otherwise the listed origins
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
