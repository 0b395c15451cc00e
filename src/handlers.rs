use crate::{
    AppState,
    auth::{AuthUser, MaybeAuthUser},
    error::{AppError, AppResult},
    guard::{self, Route, RouteDecision},
    models::{
        DashboardStats, Lead, LeadForm, PipelineView, PublicFormInfo, RegisterUserRequest,
        RescheduleRequest, Role, SelectRoleRequest, ShareLinkResponse, StatusChangeRequest,
        UserProfile, UserRecord,
    },
    pipeline::{self, Origin, StatusFilter, TimeWindow},
    roles::{self, PROBE_ORDER, SHARE_LINK_OWNERS},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

// --- Query Structs ---

/// PipelineFilter
///
/// Query parameters of `GET /leads`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PipelineFilter {
    /// `All` (default) or one status, e.g. `Follow-Up`.
    pub status: Option<String>,
    /// Case-insensitive substring of name, email or company.
    pub search: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct RouteQuery {
    /// Client path to check, e.g. `/viewpipeline`.
    pub path: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct DashboardQuery {
    /// Aggregation window; `Monthly` when omitted.
    pub window: Option<TimeWindow>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ReminderQuery {
    /// Day to list (`YYYY-MM-DD`); today (UTC) when omitted.
    pub date: Option<NaiveDate>,
}

const LEAD_NOT_FOUND: &str = "Lead not found.";
const STALE_LEAD: &str = "The lead was changed by someone else. Please refresh and try again.";

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Loads a lead and hides it unless it belongs to `company`.
async fn company_lead(state: &AppState, id: Uuid, company: &str) -> AppResult<Lead> {
    match state.repo.get_lead(id).await? {
        Some(lead) if lead.submitted_lead == company => Ok(lead),
        Some(_) => {
            tracing::warn!(%id, company, "cross-company lead access refused");
            Err(AppError::NotFound(LEAD_NOT_FOUND.to_string()))
        }
        None => Err(AppError::NotFound(LEAD_NOT_FOUND.to_string())),
    }
}

fn require(value: &str) -> bool {
    !value.trim().is_empty()
}

// --- Handlers ---

/// register_user
///
/// [Public Route] Creates the account at the identity provider, then writes the user
/// record into the collection of the chosen role.
///
/// The company name is lower-cased. Managers can only join a company that already
/// has a Company Owner.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserRecord),
        (status = 400, description = "Missing fields, weak password or unknown company"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<UserRecord>)> {
    if !(require(&payload.name)
        && require(&payload.email)
        && require(&payload.password)
        && require(&payload.company_name))
    {
        return Err(AppError::Validation(
            "Please fill in all required fields.".to_string(),
        ));
    }

    let company_name = payload.company_name.trim().to_lowercase();
    if payload.role != Role::CompanyOwner && !state.repo.company_has_owner(&company_name).await? {
        return Err(AppError::Validation(
            "Company not found. An owner must register this company first.".to_string(),
        ));
    }

    let email = payload.email.trim().to_string();
    let uid = state.identity.sign_up(&email, &payload.password).await?;

    let record = state
        .repo
        .insert_user(UserRecord {
            uid,
            name: payload.name.trim().to_string(),
            email,
            phone: payload.phone.trim().to_string(),
            role: payload.role,
            company_name,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(uid = %record.uid, role = %record.role, "user registered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// select_role
///
/// [Authenticated Route] Writes the role record of a signed-in user that has none yet.
/// Users that already hold a role are sent back to their default route.
#[utoipa::path(
    post,
    path = "/role-selection",
    request_body = SelectRoleRequest,
    responses(
        (status = 201, description = "Role stored", body = UserRecord),
        (status = 403, description = "A role is already assigned")
    )
)]
pub async fn select_role(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SelectRoleRequest>,
) -> AppResult<(StatusCode, Json<UserRecord>)> {
    user.authorize(&Route::RoleSelection)?;

    let company_name = payload
        .company_name
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if payload.role != Role::CompanyOwner
        && !company_name.is_empty()
        && !state.repo.company_has_owner(&company_name).await?
    {
        return Err(AppError::Validation(
            "Company not found. An owner must register this company first.".to_string(),
        ));
    }

    let record = state
        .repo
        .insert_user(UserRecord {
            uid: user.uid.clone(),
            name: user
                .display_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            email: user.email.clone().unwrap_or_default(),
            phone: payload.phone.unwrap_or_default(),
            role: payload.role,
            company_name,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(uid = %record.uid, role = %record.role, "role selected");
    Ok((StatusCode::CREATED, Json(record)))
}

/// get_me
///
/// [Authenticated Route] The caller's profile and the route the client should land on.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Current user", body = UserProfile))
)]
pub async fn get_me(user: AuthUser) -> Json<UserProfile> {
    let default_route = guard::default_route(user.session()).path();
    let record = user.record.as_ref();

    Json(UserProfile {
        uid: user.uid.clone(),
        email: user.email.clone().or_else(|| record.map(|r| r.email.clone())),
        name: record
            .map(|r| r.name.clone())
            .or_else(|| user.display_name.clone()),
        role: user.role(),
        company_name: record.map(|r| r.company_name.clone()),
        default_route,
    })
}

/// route_decision
///
/// [Public Route] Runs the route guard for a client path. Works for signed-out
/// visitors too, in which case the session is unauthenticated.
#[utoipa::path(
    get,
    path = "/session/route",
    params(RouteQuery),
    responses((status = 200, description = "Guard decision", body = RouteDecision))
)]
pub async fn route_decision(
    user: MaybeAuthUser,
    Query(query): Query<RouteQuery>,
) -> Json<RouteDecision> {
    let decision = guard::decide_path(user.session(), &query.path);
    Json(RouteDecision::new(&query.path, decision))
}

/// create_lead
///
/// [Authenticated Route] Internal lead intake, filed under the caller's company.
#[utoipa::path(
    post,
    path = "/leads",
    request_body = LeadForm,
    responses(
        (status = 201, description = "Lead created", body = Lead),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_lead(
    user: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<LeadForm>,
) -> AppResult<(StatusCode, Json<Lead>)> {
    user.authorize(&Route::AddNewLead)?;
    let company = user.company()?;

    let lead = pipeline::intake(
        form,
        company,
        Origin::Internal {
            created_by: user.uid.clone(),
            created_by_email: user.email.clone(),
        },
        Utc::now(),
    )?;
    let lead = state.repo.insert_lead(lead).await?;

    tracing::info!(lead_id = %lead.id, company, "lead created");
    Ok((StatusCode::CREATED, Json(lead)))
}

/// list_leads
///
/// [Authenticated Route] The company's pipeline: leads matching the status tab and
/// search term, plus per-status counts over every company lead.
#[utoipa::path(
    get,
    path = "/leads",
    params(PipelineFilter),
    responses(
        (status = 200, description = "Pipeline", body = PipelineView),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_leads(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<PipelineFilter>,
) -> AppResult<Json<PipelineView>> {
    user.authorize(&Route::ViewPipeline)?;
    let company = user.company()?;

    let status = match filter.status.as_deref() {
        None | Some("") => StatusFilter::All,
        Some(value) => StatusFilter::parse(value)
            .ok_or_else(|| AppError::Validation(format!("Unknown status filter '{}'.", value)))?,
    };

    let leads = pipeline::scope_to_company(state.repo.list_company_leads(company).await?, company);
    let counts = pipeline::status_counts(&leads);
    let leads = pipeline::filter_leads(&leads, status, filter.search.as_deref().unwrap_or(""));

    Ok(Json(PipelineView { leads, counts }))
}

/// get_lead
///
/// [Authenticated Route] A single lead of the caller's company.
#[utoipa::path(
    get,
    path = "/leads/{id}",
    params(("id" = Uuid, Path, description = "Lead ID")),
    responses(
        (status = 200, description = "Found", body = Lead),
        (status = 404, description = "Not found in the caller's company")
    )
)]
pub async fn get_lead(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Lead>> {
    user.authorize(&Route::ViewPipeline)?;
    let company = user.company()?;
    let lead = company_lead(&state, id, company).await?;
    Ok(Json(lead))
}

/// change_lead_status
///
/// [Authenticated Route] Moves a lead one step along the pipeline.
///
/// The update only lands while the lead still has the status it was validated
/// against; losing that race returns 409.
#[utoipa::path(
    post,
    path = "/leads/{id}/status",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status changed", body = Lead),
        (status = 400, description = "Missing or past follow-up date"),
        (status = 409, description = "Transition not allowed or lead changed meanwhile")
    )
)]
pub async fn change_lead_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeRequest>,
) -> AppResult<Json<Lead>> {
    user.authorize(&Route::ViewPipeline)?;
    let company = user.company()?;
    let lead = company_lead(&state, id, company).await?;

    let update = pipeline::plan_transition(&lead, payload.status, payload.follow_up_date, today())?;
    let updated = state
        .repo
        .update_lead_status(id, &update)
        .await?
        .ok_or_else(|| AppError::Conflict(STALE_LEAD.to_string()))?;

    tracing::info!(lead_id = %id, from = %update.from, to = %update.to, "lead status changed");
    Ok(Json(updated))
}

/// share_link
///
/// [Authenticated Route] The caller's public lead-form URL.
#[utoipa::path(
    get,
    path = "/share-link",
    responses((status = 200, description = "Share link", body = ShareLinkResponse))
)]
pub async fn share_link(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ShareLinkResponse>> {
    user.authorize(&Route::GenerateFormLink)?;

    let url = format!(
        "{}{}",
        state.config.public_base_url.trim_end_matches('/'),
        Route::ShareForm(user.uid.clone()).path()
    );
    Ok(Json(ShareLinkResponse { url }))
}

/// Resolves the owner of a share link among the roles allowed to hand one out.
async fn link_owner(state: &AppState, uid: &str) -> AppResult<UserRecord> {
    roles::resolve_among(state.repo.as_ref(), uid, &SHARE_LINK_OWNERS)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid form link.".to_string()))
}

/// public_form
///
/// [Public Route] What a visitor of a share link sees about the link owner.
#[utoipa::path(
    get,
    path = "/public/forms/{uid}",
    params(("uid" = String, Path, description = "Link owner uid")),
    responses(
        (status = 200, description = "Form description", body = PublicFormInfo),
        (status = 404, description = "Unknown link")
    )
)]
pub async fn public_form(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> AppResult<Json<PublicFormInfo>> {
    let owner = link_owner(&state, &uid).await?;

    let company_name = if !owner.company_name.is_empty() {
        owner.company_name.clone()
    } else if !owner.name.is_empty() {
        owner.name.clone()
    } else {
        "Contact Form".to_string()
    };

    Ok(Json(PublicFormInfo {
        uid: owner.uid,
        company_name,
        contact_name: owner.name,
        email: owner.email,
        phone: owner.phone,
        role: owner.role,
    }))
}

/// submit_public_lead
///
/// [Public Route] Files an anonymous submission under the link owner's company.
#[utoipa::path(
    post,
    path = "/public/forms/{uid}/leads",
    params(("uid" = String, Path, description = "Link owner uid")),
    request_body = LeadForm,
    responses(
        (status = 201, description = "Lead submitted", body = Lead),
        (status = 400, description = "Missing required fields"),
        (status = 404, description = "Unknown link")
    )
)]
pub async fn submit_public_lead(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(form): Json<LeadForm>,
) -> AppResult<(StatusCode, Json<Lead>)> {
    let owner = link_owner(&state, &uid).await?;

    let lead = pipeline::intake(
        form,
        &owner.company_name,
        Origin::SharedLink {
            link_owner: owner.uid.clone(),
            shared_by: owner.role,
        },
        Utc::now(),
    )?;
    let lead = state.repo.insert_lead(lead).await?;

    tracing::info!(lead_id = %lead.id, link_owner = %owner.uid, "public lead submitted");
    Ok((StatusCode::CREATED, Json(lead)))
}

/// dashboard
///
/// [Owner Route] Totals, win/loss rates and the most recent leads of one window.
#[utoipa::path(
    get,
    path = "/owner/dashboard",
    params(DashboardQuery),
    responses((status = 200, description = "Dashboard", body = DashboardStats))
)]
pub async fn dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardStats>> {
    user.authorize(&Route::Dashboard)?;
    let company = user.company()?;

    let leads = pipeline::scope_to_company(state.repo.list_company_leads(company).await?, company);
    let stats = pipeline::dashboard(&leads, query.window.unwrap_or_default(), Utc::now());
    Ok(Json(stats))
}

/// reminders
///
/// [Owner Route] Follow-Up leads due on the given day.
#[utoipa::path(
    get,
    path = "/owner/reminders",
    params(ReminderQuery),
    responses((status = 200, description = "Due follow-ups", body = [Lead]))
)]
pub async fn reminders(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ReminderQuery>,
) -> AppResult<Json<Vec<Lead>>> {
    user.authorize(&Route::DailyReminder)?;
    let company = user.company()?;
    let day = query.date.unwrap_or_else(today);

    let due = state.repo.list_follow_ups_due(company, day).await?;
    let due = pipeline::scope_to_company(due, company);
    Ok(Json(pipeline::due_follow_ups(&due, day)))
}

/// reschedule_follow_up
///
/// [Owner Route] Moves the follow-up date of a lead that stays in Follow-Up.
#[utoipa::path(
    put,
    path = "/owner/reminders/{id}",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Rescheduled", body = Lead),
        (status = 400, description = "Date in the past"),
        (status = 409, description = "Lead is not in Follow-Up")
    )
)]
pub async fn reschedule_follow_up(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleRequest>,
) -> AppResult<Json<Lead>> {
    user.authorize(&Route::DailyReminder)?;
    let company = user.company()?;
    let lead = company_lead(&state, id, company).await?;

    let date = pipeline::plan_reschedule(&lead, payload.follow_up_date, today())?;
    let updated = state
        .repo
        .set_follow_up_date(id, date)
        .await?
        .ok_or_else(|| AppError::Conflict(STALE_LEAD.to_string()))?;

    tracing::info!(lead_id = %id, %date, "follow-up rescheduled");
    Ok(Json(updated))
}

/// list_employees
///
/// [Owner Route] Every user registered under the owner's company, across all roles.
#[utoipa::path(
    get,
    path = "/owner/employees",
    responses((status = 200, description = "Employees", body = [UserRecord]))
)]
pub async fn list_employees(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserRecord>>> {
    user.authorize(&Route::Settings)?;
    let company = user.company()?;

    let mut employees = Vec::new();
    for role in PROBE_ORDER {
        employees.extend(state.repo.list_users_by_company(role, company).await?);
    }
    Ok(Json(employees))
}
