//! Route guard: which session may open which client route, and where everyone
//! else is sent instead.
//!
//! The HTTP handlers bind themselves to the route they serve and go through the
//! same decision, so the API and the client agree on access.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::Role;

/// Session
///
/// The three guard states: no session, signed in without a role record, or signed
/// in with a resolved role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    Unauthenticated,
    NoRole,
    Member(Role),
}

impl Session {
    pub fn role(&self) -> Option<Role> {
        match self {
            Session::Member(role) => Some(*role),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    RegisterCompanyOwner,
    RegisterMarketingManager,
    RegisterSalesManager,
    ShareForm(String),
    RoleSelection,
    Dashboard,
    AddNewLead,
    ViewPipeline,
    DailyReminder,
    Settings,
    GenerateFormLink,
}

/// How a route is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Open to everyone.
    Public,
    /// Open to signed-out visitors; signed-in users go to their default route.
    GuestOnly,
    /// Only for signed-in users that still have to pick a role.
    RoleSelection,
    /// Signed-in users holding one of these roles (Company Owner always passes).
    Protected(&'static [Role]),
}

const OWNER_ONLY: &[Role] = &[Role::CompanyOwner];
const LEAD_INTAKE: &[Role] = &[Role::MarketingManager, Role::CompanyOwner];
const PIPELINE: &[Role] = &[Role::SalesManager, Role::CompanyOwner];
const SHARE_LINK: &[Role] = &[Role::CompanyOwner, Role::SalesManager];

impl Route {
    /// Maps a client path to its route. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            other => other,
        };

        if let Some(uid) = trimmed.strip_prefix("/share-form/") {
            if !uid.is_empty() && !uid.contains('/') {
                return Some(Route::ShareForm(uid.to_string()));
            }
            return None;
        }

        match trimmed {
            "/login" => Some(Route::Login),
            "/company-owner/register" => Some(Route::RegisterCompanyOwner),
            "/marketing-manager/register" => Some(Route::RegisterMarketingManager),
            "/sales-manager/register" => Some(Route::RegisterSalesManager),
            "/role-selection" => Some(Route::RoleSelection),
            "/" => Some(Route::Dashboard),
            "/addnewlead" => Some(Route::AddNewLead),
            "/viewpipeline" => Some(Route::ViewPipeline),
            "/dailyreminder" => Some(Route::DailyReminder),
            "/settings" => Some(Route::Settings),
            "/generate-form-link" => Some(Route::GenerateFormLink),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::RegisterCompanyOwner => "/company-owner/register".to_string(),
            Route::RegisterMarketingManager => "/marketing-manager/register".to_string(),
            Route::RegisterSalesManager => "/sales-manager/register".to_string(),
            Route::ShareForm(uid) => format!("/share-form/{}", uid),
            Route::RoleSelection => "/role-selection".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::AddNewLead => "/addnewlead".to_string(),
            Route::ViewPipeline => "/viewpipeline".to_string(),
            Route::DailyReminder => "/dailyreminder".to_string(),
            Route::Settings => "/settings".to_string(),
            Route::GenerateFormLink => "/generate-form-link".to_string(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login => Access::GuestOnly,
            Route::RegisterCompanyOwner
            | Route::RegisterMarketingManager
            | Route::RegisterSalesManager
            | Route::ShareForm(_) => Access::Public,
            Route::RoleSelection => Access::RoleSelection,
            Route::Dashboard | Route::DailyReminder | Route::Settings => {
                Access::Protected(OWNER_ONLY)
            }
            Route::AddNewLead => Access::Protected(LEAD_INTAKE),
            Route::ViewPipeline => Access::Protected(PIPELINE),
            Route::GenerateFormLink => Access::Protected(SHARE_LINK),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(Route),
}

/// Landing route for a session.
pub fn default_route(session: Session) -> Route {
    match session {
        Session::Unauthenticated => Route::Login,
        Session::NoRole => Route::RoleSelection,
        Session::Member(Role::CompanyOwner) => Route::Dashboard,
        Session::Member(Role::MarketingManager) => Route::AddNewLead,
        Session::Member(Role::SalesManager) => Route::ViewPipeline,
    }
}

pub fn can_access(session: Session, allowed: &[Role]) -> bool {
    match session {
        Session::Member(Role::CompanyOwner) => true,
        Session::Member(role) => allowed.contains(&role),
        _ => false,
    }
}

pub fn decide(session: Session, route: &Route) -> Decision {
    match (route.access(), session) {
        (Access::Public, _) => Decision::Allow,
        (Access::GuestOnly, Session::Unauthenticated) => Decision::Allow,
        (Access::GuestOnly, _) => Decision::Redirect(default_route(session)),
        (Access::RoleSelection, Session::NoRole) => Decision::Allow,
        (Access::RoleSelection, _) => Decision::Redirect(default_route(session)),
        (Access::Protected(_), Session::Unauthenticated) => Decision::Redirect(Route::Login),
        (Access::Protected(_), Session::NoRole) => Decision::Redirect(Route::RoleSelection),
        (Access::Protected(allowed), _) if can_access(session, allowed) => Decision::Allow,
        (Access::Protected(_), _) => Decision::Redirect(default_route(session)),
    }
}

/// Decision for a raw client path; unknown paths redirect to the default route.
pub fn decide_path(session: Session, path: &str) -> Decision {
    match Route::parse(path) {
        Some(route) => decide(session, &route),
        None => Decision::Redirect(default_route(session)),
    }
}

/// RouteDecision
///
/// Output of `GET /session/route`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteDecision {
    pub path: String,
    pub allowed: bool,
    pub redirect: Option<String>,
}

impl RouteDecision {
    pub fn new(path: &str, decision: Decision) -> Self {
        match decision {
            Decision::Allow => Self {
                path: path.to_string(),
                allowed: true,
                redirect: None,
            },
            Decision::Redirect(route) => Self {
                path: path.to_string(),
                allowed: false,
                redirect: Some(route.path()),
            },
        }
    }
}
