use lead_pipeline::{
    guard::{
        Access, Decision, Route, RouteDecision, Session, can_access, decide, decide_path,
        default_route,
    },
    models::Role,
};

const OWNER: Session = Session::Member(Role::CompanyOwner);
const MARKETING: Session = Session::Member(Role::MarketingManager);
const SALES: Session = Session::Member(Role::SalesManager);

fn protected_routes() -> Vec<Route> {
    vec![
        Route::Dashboard,
        Route::AddNewLead,
        Route::ViewPipeline,
        Route::DailyReminder,
        Route::Settings,
        Route::GenerateFormLink,
    ]
}

#[test]
fn test_default_routes() {
    assert_eq!(default_route(Session::Unauthenticated), Route::Login);
    assert_eq!(default_route(Session::NoRole), Route::RoleSelection);
    assert_eq!(default_route(OWNER).path(), "/");
    assert_eq!(default_route(MARKETING).path(), "/addnewlead");
    assert_eq!(default_route(SALES).path(), "/viewpipeline");
}

#[test]
fn test_parse_known_paths() {
    assert_eq!(Route::parse("/"), Some(Route::Dashboard));
    assert_eq!(Route::parse(""), Some(Route::Dashboard));
    assert_eq!(Route::parse("/viewpipeline/"), Some(Route::ViewPipeline));
    assert_eq!(
        Route::parse("/share-form/abc123"),
        Some(Route::ShareForm("abc123".to_string()))
    );
    assert_eq!(Route::parse("/share-form/"), None);
    assert_eq!(Route::parse("/share-form/a/b"), None);
    assert_eq!(Route::parse("/admin"), None);
}

#[test]
fn test_paths_round_trip_through_parse() {
    let mut routes = protected_routes();
    routes.extend([
        Route::Login,
        Route::RegisterCompanyOwner,
        Route::RegisterMarketingManager,
        Route::RegisterSalesManager,
        Route::RoleSelection,
        Route::ShareForm("u1".to_string()),
    ]);
    for route in routes {
        assert_eq!(Route::parse(&route.path()), Some(route.clone()));
    }
}

#[test]
fn test_owner_reaches_every_protected_route() {
    for route in protected_routes() {
        assert_eq!(decide(OWNER, &route), Decision::Allow, "{:?}", route);
    }
}

#[test]
fn test_managers_only_reach_their_routes() {
    assert_eq!(decide(MARKETING, &Route::AddNewLead), Decision::Allow);
    assert_eq!(
        decide(MARKETING, &Route::ViewPipeline),
        Decision::Redirect(Route::AddNewLead)
    );
    assert_eq!(
        decide(MARKETING, &Route::GenerateFormLink),
        Decision::Redirect(Route::AddNewLead)
    );

    assert_eq!(decide(SALES, &Route::ViewPipeline), Decision::Allow);
    assert_eq!(decide(SALES, &Route::GenerateFormLink), Decision::Allow);
    for route in [Route::Dashboard, Route::DailyReminder, Route::Settings, Route::AddNewLead] {
        assert_eq!(
            decide(SALES, &route),
            Decision::Redirect(Route::ViewPipeline),
            "{:?}",
            route
        );
    }
}

#[test]
fn test_protected_routes_without_role_or_session() {
    for route in protected_routes() {
        assert_eq!(
            decide(Session::Unauthenticated, &route),
            Decision::Redirect(Route::Login)
        );
        assert_eq!(
            decide(Session::NoRole, &route),
            Decision::Redirect(Route::RoleSelection)
        );
    }
}

#[test]
fn test_login_is_guest_only() {
    assert_eq!(decide(Session::Unauthenticated, &Route::Login), Decision::Allow);
    assert_eq!(
        decide(SALES, &Route::Login),
        Decision::Redirect(Route::ViewPipeline)
    );
    assert_eq!(
        decide(Session::NoRole, &Route::Login),
        Decision::Redirect(Route::RoleSelection)
    );
}

#[test]
fn test_role_selection_only_without_role() {
    assert_eq!(decide(Session::NoRole, &Route::RoleSelection), Decision::Allow);
    assert_eq!(
        decide(Session::Unauthenticated, &Route::RoleSelection),
        Decision::Redirect(Route::Login)
    );
    assert_eq!(
        decide(OWNER, &Route::RoleSelection),
        Decision::Redirect(Route::Dashboard)
    );
}

#[test]
fn test_public_routes_open_to_all() {
    let public = [
        Route::RegisterCompanyOwner,
        Route::RegisterMarketingManager,
        Route::RegisterSalesManager,
        Route::ShareForm("x".to_string()),
    ];
    for route in public {
        assert_eq!(route.access(), Access::Public);
        for session in [Session::Unauthenticated, Session::NoRole, OWNER, MARKETING, SALES] {
            assert_eq!(decide(session, &route), Decision::Allow);
        }
    }
}

#[test]
fn test_can_access() {
    assert!(can_access(OWNER, &[]));
    assert!(can_access(SALES, &[Role::SalesManager]));
    assert!(!can_access(SALES, &[Role::MarketingManager]));
    assert!(!can_access(Session::NoRole, &[Role::SalesManager]));
}

#[test]
fn test_unknown_path_redirects_to_default() {
    assert_eq!(
        decide_path(MARKETING, "/nope"),
        Decision::Redirect(Route::AddNewLead)
    );
    assert_eq!(
        decide_path(Session::Unauthenticated, "/nope"),
        Decision::Redirect(Route::Login)
    );
}

#[test]
fn test_route_decision_body() {
    let allowed = RouteDecision::new("/viewpipeline", decide_path(SALES, "/viewpipeline"));
    assert!(allowed.allowed);
    assert_eq!(allowed.redirect, None);

    let denied = RouteDecision::new("/settings", decide_path(SALES, "/settings"));
    assert!(!denied.allowed);
    assert_eq!(denied.redirect.as_deref(), Some("/viewpipeline"));
    assert_eq!(denied.path, "/settings");
}
