use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Owner Router Module
///
/// Company Owner screens: dashboard, daily reminders and settings. Nested under
/// `/owner`. Managers reaching these endpoints get a 403 carrying their own
/// default route.
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        // GET /owner/dashboard?window=Daily|Weekly|Monthly
        .route("/dashboard", get(handlers::dashboard))
        // GET /owner/reminders?date=YYYY-MM-DD
        // Follow-Up leads due on the day (today when omitted).
        .route("/reminders", get(handlers::reminders))
        // PUT /owner/reminders/{id}
        // Moves the follow-up date without leaving Follow-Up.
        .route("/reminders/{id}", put(handlers::reschedule_follow_up))
        // GET /owner/employees
        // Every user of the owner's company across the three roles.
        .route("/employees", get(handlers::list_employees))
}
