// app.rs - state assembly and HTTP routing

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info_span, warn};

use crate::auth::password::PasswordHasher;
use crate::auth::{JwtCodec, JwtError};
use crate::cache::{CacheClient, PendingRegistrationStore};
use crate::config::AppConfig;
use crate::database::store::Storage;
use crate::handlers::{protected, public};
use crate::mail::Mailer;
use crate::middleware::jwt_auth_middleware;
use crate::services::{
    AssignmentService, CatalogService, ProvisioningService, SessionService, TenantGuard,
};

/// Services shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub provisioning: Arc<ProvisioningService>,
    pub sessions: Arc<SessionService>,
    pub catalog: Arc<CatalogService>,
    pub assignments: Arc<AssignmentService>,
}

impl AppState {
    /// Wire the services over the given collaborators. Each service logs
    /// inside its own span.
    pub fn new(
        config: &AppConfig,
        storage: Arc<dyn Storage>,
        cache: Arc<dyn CacheClient>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, JwtError> {
        let hasher = PasswordHasher::new(config.security.bcrypt_cost);
        let jwt = JwtCodec::new(&config.security)?;
        let guard = TenantGuard::new(storage.clone());

        let provisioning = ProvisioningService::new(
            storage.clone(),
            PendingRegistrationStore::new(cache),
            mailer,
            hasher,
            Duration::from_secs(config.registration.ttl_secs),
            info_span!("provisioning"),
        );
        let sessions = SessionService::new(storage.clone(), hasher, jwt, info_span!("session"));
        let catalog = CatalogService::new(
            storage.clone(),
            guard.clone(),
            hasher,
            info_span!("catalog"),
        );
        let assignments = AssignmentService::new(storage.clone(), guard, info_span!("assignment"));

        Ok(Self {
            storage,
            provisioning: Arc::new(provisioning),
            sessions: Arc::new(sessions),
            catalog: Arc::new(catalog),
            assignments: Arc::new(assignments),
        })
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/health", get(public::health_get))
        .route("/auth/register", post(auth::register_post))
        .route("/auth/register/resend", post(auth::resend_post))
        .route("/auth/verify", post(auth::verify_post))
        .route("/auth/login", post(auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{company, courses, lessons, positions, users};

    Router::new()
        .route("/api/positions", get(positions::list_get).post(positions::create_post))
        .route(
            "/api/positions/:id/courses",
            get(positions::courses_get).post(positions::courses_post),
        )
        .route("/api/courses", get(courses::list_get).post(courses::create_post))
        .route("/api/courses/:id", patch(courses::update_patch))
        .route(
            "/api/courses/:id/lessons",
            get(lessons::list_get).post(lessons::create_post),
        )
        .route("/api/lessons/:id", patch(lessons::update_patch))
        .route("/api/users", post(users::create_post))
        .route("/api/users/:id", patch(users::update_patch))
        .route("/api/users/:id/position", put(users::position_put))
        .route("/api/me/lessons", get(lessons::mine_get))
        .route("/api/company", patch(company::update_patch))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
