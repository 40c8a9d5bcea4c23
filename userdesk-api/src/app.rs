/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use userdesk_api::{app::AppState, config::Config};
/// use userdesk_api::services::users::{PgUserStore, UserService};
/// use userdesk_shared::auth::jwt::TokenVerifier;
/// use userdesk_shared::identity::HttpIdentityProvider;
/// use userdesk_shared::storage::{HttpObjectStore, StorageConfig};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
///
/// let users = UserService::new(
///     PgUserStore::new(pool.clone()),
///     HttpIdentityProvider::new(config.identity.api_url.clone(), config.identity.api_key.clone()),
///     HttpObjectStore::new(StorageConfig {
///         base_url: config.storage.base_url.clone(),
///         api_key: config.storage.api_key.clone(),
///         bucket: config.storage.bucket.clone(),
///         folder: config.storage.folder.clone(),
///     }),
/// );
/// let verifier = TokenVerifier::new(
///     config.identity.jwks_url.clone(),
///     config.identity.issuer.clone(),
/// );
///
/// let state = AppState::new(pool, config, users, verifier);
/// let app = userdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use userdesk_shared::auth::jwt::TokenVerifier;
use userdesk_shared::auth::middleware::{require_admin, AuthContext};
use userdesk_shared::identity::HttpIdentityProvider;
use userdesk_shared::storage::HttpObjectStore;

use crate::services::users::{PgUserStore, UserService};

/// The user service as wired in production
pub type Users = UserService<PgUserStore, HttpIdentityProvider, HttpObjectStore>;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// User-account orchestration service
    pub users: Arc<Users>,

    /// Bearer-token verifier backed by the provider's key-set endpoint
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, users: Users, verifier: TokenVerifier) -> Self {
        Self {
            db,
            config: Arc::new(config),
            users: Arc::new(users),
            verifier: Arc::new(verifier),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /v1/                          # API v1 (versioned)
///     ├── /admin/users/             # Administrative CRUD (ADMIN role)
///     │   ├── GET    /
///     │   ├── POST   /              # multipart: user JSON + optional file
///     │   ├── GET    /:id
///     │   ├── PUT    /:id           # multipart: user JSON + optional file
///     │   ├── DELETE /:id
///     │   ├── GET    /email/:email
///     │   └── GET    /email-exists/:email
///     └── /users/                   # Self-service (authenticated)
///         ├── GET /me
///         ├── PUT /me
///         ├── PUT /password
///         └── PUT /email
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Bearer authentication (per sub-router), plus the ADMIN gate on the
///    administrative sub-router
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Administrative routes: bearer auth + ADMIN role gate
    let admin_routes = Router::new()
        .route(
            "/",
            get(routes::admin_users::list_users).post(routes::admin_users::create_user),
        )
        .route(
            "/:id",
            get(routes::admin_users::get_user)
                .put(routes::admin_users::update_user)
                .delete(routes::admin_users::delete_user),
        )
        .route("/email/:email", get(routes::admin_users::get_user_by_email))
        .route(
            "/email-exists/:email",
            get(routes::admin_users::email_exists),
        )
        .layer(axum::middleware::from_fn(require_admin))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    // Self-service routes: any authenticated principal
    let profile_routes = Router::new()
        .route(
            "/me",
            get(routes::profile::my_profile).put(routes::profile::update_my_profile),
        )
        .route("/password", put(routes::profile::change_password))
        .route("/email", put(routes::profile::change_email))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/admin/users", admin_routes)
        .nest("/users", profile_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer authentication middleware layer
///
/// Extracts the bearer token from the Authorization header, validates it
/// against the provider's key set, and injects an [`AuthContext`] into the
/// request extensions.
async fn bearer_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    // Parse Bearer token
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    // Validate token against the provider's key set
    let claims = state.verifier.verify(token).await?;

    // Insert into request extensions
    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
