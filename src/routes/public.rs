use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without credentials. Share-link handlers only reveal the
/// link owner's contact card and only accept new leads, never read them.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Creates the identity-provider account and the role record in one step.
        .route("/register", post(handlers::register_user))
        // GET /session/route?path=...
        // Route-guard decision for a client path. Credentials are optional here.
        .route("/session/route", get(handlers::route_decision))
        // GET /public/forms/{uid}
        // Contact card of a share-link owner (Company Owner or Sales Manager).
        .route("/public/forms/{uid}", get(handlers::public_form))
        // POST /public/forms/{uid}/leads
        // Anonymous lead submission, filed under the link owner's company.
        .route(
            "/public/forms/{uid}/leads",
            post(handlers::submit_public_lead),
        )
}
