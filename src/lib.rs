use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod repository;

// Business rules, free of I/O.
pub mod guard;
pub mod pipeline;
pub mod roles;

// Routing split by authentication requirement (Public, Authenticated, Owner).
pub mod routes;
use routes::{authenticated, owner, public};
use auth::AuthUser;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use identity::{HttpIdentityProvider, IdentityState, MockIdentityProvider};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every handler annotated with `#[utoipa::path]`, served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::select_role, handlers::get_me,
        handlers::route_decision, handlers::create_lead, handlers::list_leads,
        handlers::get_lead, handlers::change_lead_status, handlers::share_link,
        handlers::public_form, handlers::submit_public_lead, handlers::dashboard,
        handlers::reminders, handlers::reschedule_follow_up, handlers::list_employees
    ),
    components(
        schemas(
            models::Role, models::LeadStatus, models::Priority, models::FormSource,
            models::UserRecord, models::Lead, models::RegisterUserRequest,
            models::SelectRoleRequest, models::LeadForm, models::StatusChangeRequest,
            models::RescheduleRequest, models::UserProfile, models::StatusCounts,
            models::PipelineView, models::DashboardStats, models::ShareLinkResponse,
            models::PublicFormInfo, pipeline::TimeWindow, guard::RouteDecision,
        )
    ),
    tags(
        (name = "lead-pipeline", description = "Role-based lead management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single cloneable container of the shared services, handed to every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres in production, in-memory mocks in tests).
    pub repo: RepositoryState,
    /// Hosted identity provider used for account sign-up.
    pub identity: IdentityState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects requests without valid credentials before any handler runs. The resolved
/// `AuthUser` is stored in the request extensions so the handler's own extractor
/// reuses it instead of resolving the role a second time.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, scoped middleware and the observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Owner routes share the auth layer; the owner-only check runs in the handlers.
        .nest(
            "/owner",
            owner::owner_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the `http_request` span for `TraceLayer`, tagging it with the request id
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
