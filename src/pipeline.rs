//! Lead pipeline rules: the forward-only status graph, lead intake, company
//! scoping, list filtering and dashboard aggregation.
//!
//! Everything here is pure; handlers fetch the company's leads and hand them in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{DashboardStats, FormSource, Lead, LeadForm, LeadStatus, Role, StatusCounts},
};

/// Number of leads shown in the dashboard's "recent" panel.
pub const RECENT_LEADS: usize = 7;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

// --- Status transitions ---

impl LeadStatus {
    /// Stages reachable from this one in a single step.
    pub fn next_statuses(&self) -> &'static [LeadStatus] {
        match self {
            LeadStatus::New => &[LeadStatus::Contacted],
            LeadStatus::Contacted => &[LeadStatus::Qualified, LeadStatus::Lost],
            LeadStatus::Qualified => &[LeadStatus::FollowUp, LeadStatus::Won, LeadStatus::Lost],
            LeadStatus::FollowUp => &[LeadStatus::Won, LeadStatus::Lost],
            LeadStatus::Won | LeadStatus::Lost => &[],
        }
    }

    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_statuses().is_empty()
    }
}

/// StatusUpdate
///
/// A validated status change. `from` is the status the lead had when the change was
/// planned; the repository only applies the update while the lead still has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub from: LeadStatus,
    pub to: LeadStatus,
    pub follow_up_date: Option<NaiveDate>,
}

/// Validates moving `lead` to `next`.
///
/// Entering Follow-Up needs a follow-up date no earlier than `today`; any other move
/// must not carry one.
pub fn plan_transition(
    lead: &Lead,
    next: LeadStatus,
    follow_up_date: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<StatusUpdate> {
    if !lead.status.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: lead.status,
            to: next,
        });
    }

    match (next, follow_up_date) {
        (LeadStatus::FollowUp, None) => Err(AppError::Validation(
            "Please select a follow-up date.".to_string(),
        )),
        (LeadStatus::FollowUp, Some(date)) if date < today => Err(AppError::Validation(
            "The follow-up date cannot be in the past.".to_string(),
        )),
        (LeadStatus::FollowUp, Some(date)) => Ok(StatusUpdate {
            from: lead.status,
            to: next,
            follow_up_date: Some(date),
        }),
        (_, Some(_)) => Err(AppError::Validation(
            "A follow-up date can only be set when moving a lead to Follow-Up.".to_string(),
        )),
        (_, None) => Ok(StatusUpdate {
            from: lead.status,
            to: next,
            follow_up_date: None,
        }),
    }
}

/// Validates moving the follow-up date of a lead that is already in Follow-Up.
pub fn plan_reschedule(lead: &Lead, date: NaiveDate, today: NaiveDate) -> AppResult<NaiveDate> {
    if lead.status != LeadStatus::FollowUp {
        return Err(AppError::Conflict(format!(
            "Only Follow-Up leads can be rescheduled; this lead is {}.",
            lead.status
        )));
    }
    if date < today {
        return Err(AppError::Validation(
            "The follow-up date cannot be in the past.".to_string(),
        ));
    }
    Ok(date)
}

// --- Intake ---

/// Where a new lead comes from.
#[derive(Debug, Clone)]
pub enum Origin {
    /// The authenticated intake form.
    Internal {
        created_by: String,
        created_by_email: Option<String>,
    },
    /// A public share-link submission.
    SharedLink { link_owner: String, shared_by: Role },
}

/// Builds a new lead for `company` from a submitted form.
pub fn intake(
    form: LeadForm,
    company: &str,
    origin: Origin,
    now: DateTime<Utc>,
) -> AppResult<Lead> {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.phone.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Please fill in all required fields (Name, Email, Phone).".to_string(),
        ));
    }
    if company.trim().is_empty() {
        return Err(AppError::Validation(
            "Unable to determine your company. Please contact support.".to_string(),
        ));
    }

    let (created_by, created_by_email, form_source, shared_by, link_owner) = match origin {
        Origin::Internal {
            created_by,
            created_by_email,
        } => (created_by, created_by_email, FormSource::Internal, None, None),
        Origin::SharedLink {
            link_owner,
            shared_by,
        } => (
            "public_form".to_string(),
            None,
            FormSource::SharedLink,
            Some(shared_by),
            Some(link_owner),
        ),
    };

    Ok(Lead {
        id: Uuid::new_v4(),
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        company: form.company,
        address: form.address,
        city: form.city,
        state: form.state,
        zip_code: form.zip_code,
        country: form.country,
        services: form.services,
        budget: form.budget,
        timeline: form.timeline,
        source: form.source,
        notes: form.notes,
        priority: form.priority,
        status: LeadStatus::New,
        follow_up_date: None,
        submitted_lead: company.to_string(),
        created_by,
        created_by_email,
        form_source,
        shared_by,
        link_owner,
        created_at: now,
        updated_at: now,
    })
}

// --- Scoping & filtering ---

/// Drops every lead not submitted under `company`.
pub fn scope_to_company(leads: Vec<Lead>, company: &str) -> Vec<Lead> {
    leads
        .into_iter()
        .filter(|lead| lead.submitted_lead == company)
        .collect()
}

/// Status tab of the pipeline view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(LeadStatus),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<StatusFilter> {
        if value == "All" {
            return Some(StatusFilter::All);
        }
        LeadStatus::parse(value).map(StatusFilter::Only)
    }

    pub fn matches(&self, status: LeadStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

/// Case-insensitive substring match on name, email and company.
pub fn matches_search(lead: &Lead, term: &str) -> bool {
    let term = term.to_lowercase();
    lead.name.to_lowercase().contains(&term)
        || lead.email.to_lowercase().contains(&term)
        || lead.company.to_lowercase().contains(&term)
}

pub fn filter_leads(leads: &[Lead], status: StatusFilter, search: &str) -> Vec<Lead> {
    leads
        .iter()
        .filter(|lead| status.matches(lead.status) && matches_search(lead, search))
        .cloned()
        .collect()
}

pub fn status_counts(leads: &[Lead]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for lead in leads {
        match lead.status {
            LeadStatus::New => counts.new += 1,
            LeadStatus::Contacted => counts.contacted += 1,
            LeadStatus::Qualified => counts.qualified += 1,
            LeadStatus::FollowUp => counts.follow_up += 1,
            LeadStatus::Won => counts.won += 1,
            LeadStatus::Lost => counts.lost += 1,
        }
    }
    counts
}

// --- Dashboard ---

/// TimeWindow
///
/// Dashboard aggregation window, measured back from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum TimeWindow {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl TimeWindow {
    pub fn millis(&self) -> i64 {
        match self {
            TimeWindow::Daily => DAY_MS,
            TimeWindow::Weekly => 7 * DAY_MS,
            TimeWindow::Monthly => 30 * DAY_MS,
        }
    }

    /// Inclusive: a lead created exactly one window ago is still inside.
    pub fn contains(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        (now - created_at).num_milliseconds() <= self.millis()
    }
}

/// Share of `part` in `total` as a whole percentage, rounded half up.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

pub fn dashboard(leads: &[Lead], window: TimeWindow, now: DateTime<Utc>) -> DashboardStats {
    let mut in_window: Vec<Lead> = leads
        .iter()
        .filter(|lead| window.contains(lead.created_at, now))
        .cloned()
        .collect();
    in_window.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let counts = status_counts(&in_window);
    let total = counts.total();
    let won = counts.get(LeadStatus::Won);
    let lost = counts.get(LeadStatus::Lost);

    in_window.truncate(RECENT_LEADS);

    DashboardStats {
        window,
        total_leads: total,
        won_leads: won,
        lost_leads: lost,
        win_percentage: percentage(won, total),
        lost_percentage: percentage(lost, total),
        recent_leads: in_window,
    }
}

/// Follow-Up leads whose follow-up falls on `day`.
pub fn due_follow_ups(leads: &[Lead], day: NaiveDate) -> Vec<Lead> {
    leads
        .iter()
        .filter(|lead| lead.status == LeadStatus::FollowUp && lead.follow_up_date == Some(day))
        .cloned()
        .collect()
}
