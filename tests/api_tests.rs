mod common;

use common::{MemoryRepo, state};
use lead_pipeline::{
    create_router,
    models::{DashboardStats, Lead, PipelineView, PublicFormInfo, UserProfile, UserRecord},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepo>,
    pub client: reqwest::Client,
}

/// Serves the full router (layers included) on an ephemeral port, backed by the
/// in-memory repository and the mock identity provider.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepo::new());
    let router = create_router(state(repo.clone()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn register(&self, role: &str, company: &str, email: &str) -> UserRecord {
        let response = self
            .client
            .post(self.url("/register"))
            .json(&json!({
                "name": "Test User",
                "email": email,
                "phone": "555-0000",
                "companyName": company,
                "password": "secret123",
                "role": role,
            }))
            .send()
            .await
            .expect("register request failed");
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/api-docs/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let doc: Value = response.json().await.unwrap();
    assert!(doc["paths"].get("/leads/{id}/status").is_some());
}

#[tokio::test]
async fn test_protected_routes_require_credentials() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/leads")).send().await.unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["redirect"], "/login");

    let response = app
        .client
        .get(app.url("/owner/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_route_probe_for_visitor() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/session/route"))
        .query(&[("path", "/settings")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["redirect"], "/login");
}

#[tokio::test]
async fn test_lead_lifecycle_across_roles() {
    let app = spawn_app().await;

    let owner = app
        .register("Company Owner", "Acme", "owner@acme.io")
        .await;
    assert_eq!(owner.company_name, "acme");
    let marketing = app
        .register("Marketing Manager", "ACME", "mm@acme.io")
        .await;
    let sales = app.register("Sales Manager", "acme", "sm@acme.io").await;

    // Each role lands on its own screen.
    let me: UserProfile = app
        .client
        .get(app.url("/me"))
        .header("x-user-id", &owner.uid)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me.default_route, "/");

    // Marketing files a lead.
    let response = app
        .client
        .post(app.url("/leads"))
        .header("x-user-id", &marketing.uid)
        .json(&json!({ "name": "Ann", "email": "ann@x.io", "phone": "1", "priority": "High" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: Lead = response.json().await.unwrap();
    assert_eq!(created.submitted_lead, "acme");

    // Sales sees it in the pipeline and moves it on.
    let view: PipelineView = app
        .client
        .get(app.url("/leads"))
        .header("x-user-id", &sales.uid)
        .query(&[("status", "New")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view.leads.len(), 1);
    assert_eq!(view.counts.new, 1);

    let response = app
        .client
        .post(app.url(&format!("/leads/{}/status", created.id)))
        .header("x-user-id", &sales.uid)
        .json(&json!({ "status": "Contacted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        app.repo.lead(created.id).unwrap().status.as_str(),
        "Contacted"
    );

    // Skipping ahead is refused.
    let response = app
        .client
        .post(app.url(&format!("/leads/{}/status", created.id)))
        .header("x-user-id", &sales.uid)
        .json(&json!({ "status": "Won" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Sales cannot open the owner dashboard.
    let response = app
        .client
        .get(app.url("/owner/dashboard"))
        .header("x-user-id", &sales.uid)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["redirect"], "/viewpipeline");

    // The owner can.
    let stats: DashboardStats = app
        .client
        .get(app.url("/owner/dashboard"))
        .header("x-user-id", &owner.uid)
        .query(&[("window", "Daily")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.total_leads, 1);
    assert_eq!(stats.recent_leads.len(), 1);

    let employees: Vec<UserRecord> = app
        .client
        .get(app.url("/owner/employees"))
        .header("x-user-id", &owner.uid)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(employees.len(), 3);
}

#[tokio::test]
async fn test_manager_cannot_register_for_unknown_company() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(app.url("/register"))
        .json(&json!({
            "name": "Sam",
            "email": "sam@nowhere.io",
            "companyName": "nowhere",
            "password": "secret123",
            "role": "Sales Manager",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid-argument");
}

#[tokio::test]
async fn test_public_share_link_flow() {
    let app = spawn_app().await;
    let owner = app.register("Company Owner", "Initech", "boss@initech.io").await;

    let link: Value = app
        .client
        .get(app.url("/share-link"))
        .header("x-user-id", &owner.uid)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        link["url"],
        format!("http://localhost:5173/share-form/{}", owner.uid)
    );

    let info: PublicFormInfo = app
        .client
        .get(app.url(&format!("/public/forms/{}", owner.uid)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info.company_name, "initech");

    let response = app
        .client
        .post(app.url(&format!("/public/forms/{}/leads", owner.uid)))
        .json(&json!({ "name": "Visitor", "email": "v@x.io", "phone": "2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let lead: Lead = response.json().await.unwrap();
    assert_eq!(lead.created_by, "public_form");
    assert_eq!(lead.submitted_lead, "initech");

    let response = app
        .client
        .get(app.url("/public/forms/unknown-uid"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
