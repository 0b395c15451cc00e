use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any signed-in user. The auth middleware on this router guarantees an
/// `AuthUser`; each handler then checks the caller's role against the client route
/// it belongs to.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Profile, resolved role and default landing route.
        .route("/me", get(handlers::get_me))
        // POST /role-selection
        // First role choice for users signed in without a role record.
        .route("/role-selection", post(handlers::select_role))
        // --- Leads ---
        // POST /leads: internal intake (Marketing Manager, Company Owner).
        // GET /leads?status=...&search=...: pipeline view (Sales Manager, Company Owner).
        .route(
            "/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        )
        .route("/leads/{id}", get(handlers::get_lead))
        // POST /leads/{id}/status
        // Forward-only status transition, guarded against concurrent changes.
        .route("/leads/{id}/status", post(handlers::change_lead_status))
        // GET /share-link
        // Public form URL of the caller (Sales Manager, Company Owner).
        .route("/share-link", get(handlers::share_link))
}
