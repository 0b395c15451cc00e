use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pipeline::TimeWindow;

// --- Enumerations ---

/// Role
///
/// The three organisational roles. Each role owns its own user collection
/// (a table in Postgres) keyed by the identity provider's uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Role {
    #[serde(rename = "Company Owner")]
    CompanyOwner,
    #[serde(rename = "Marketing Manager")]
    MarketingManager,
    #[serde(rename = "Sales Manager")]
    SalesManager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::CompanyOwner => "Company Owner",
            Role::MarketingManager => "Marketing Manager",
            Role::SalesManager => "Sales Manager",
        }
    }

    /// Name of the collection holding this role's user records.
    pub fn collection(&self) -> &'static str {
        match self {
            Role::CompanyOwner => "company_owner",
            Role::MarketingManager => "marketing_manager",
            Role::SalesManager => "sales_manager",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "Company Owner" => Some(Role::CompanyOwner),
            "Marketing Manager" => Some(Role::MarketingManager),
            "Sales Manager" => Some(Role::SalesManager),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LeadStatus
///
/// Pipeline stage of a lead. Allowed moves between stages live in `pipeline`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema,
)]
#[ts(export)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    #[serde(rename = "Follow-Up")]
    FollowUp,
    Won,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::FollowUp,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::FollowUp => "Follow-Up",
            LeadStatus::Won => "Won",
            LeadStatus::Lost => "Lost",
        }
    }

    pub fn parse(value: &str) -> Option<LeadStatus> {
        LeadStatus::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema,
)]
#[ts(export)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Priority> {
        match value {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            "Urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// FormSource
///
/// Which collector produced a lead: the authenticated intake form or a public share link.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FormSource {
    #[default]
    Internal,
    SharedLink,
}

impl FormSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormSource::Internal => "internal",
            FormSource::SharedLink => "shared_link",
        }
    }

    pub fn parse(value: &str) -> Option<FormSource> {
        match value {
            "internal" => Some(FormSource::Internal),
            "shared_link" => Some(FormSource::SharedLink),
            _ => None,
        }
    }
}

// --- Stored Records ---

/// UserRecord
///
/// A registered user as stored in its role's collection. `company_name` is always
/// lower-cased; leads are scoped against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserRecord {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub company_name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Lead
///
/// A prospective customer tracked through the pipeline. `submitted_lead` names the
/// owning company and is the scoping key for every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub services: String,
    pub budget: String,
    pub timeline: String,
    pub source: String,
    pub notes: String,
    pub priority: Priority,
    pub status: LeadStatus,
    pub follow_up_date: Option<NaiveDate>,
    pub submitted_lead: String,
    // Creator uid, or `public_form` for share-link submissions.
    pub created_by: String,
    pub created_by_email: Option<String>,
    pub form_source: FormSource,
    // Role and uid of the share-link owner.
    pub shared_by: Option<Role>,
    pub link_owner: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads ---

/// RegisterUserRequest
///
/// Input for `POST /register`. The password is forwarded to the identity provider
/// and never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub company_name: String,
    pub password: String,
    pub role: Role,
}

/// SelectRoleRequest
///
/// Input for `POST /role-selection`, sent by a signed-in user that has no role yet
/// (typically after an OAuth sign-in).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SelectRoleRequest {
    pub role: Role,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// LeadForm
///
/// Fields collected by both the internal and the public lead forms. Only name,
/// email and phone are mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub services: String,
    pub budget: String,
    pub timeline: String,
    pub source: String,
    pub notes: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatusChangeRequest {
    pub status: LeadStatus,
    // Required when moving to Follow-Up, rejected otherwise.
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RescheduleRequest {
    pub follow_up_date: NaiveDate,
}

// --- Responses ---

/// UserProfile
///
/// Output of `GET /me`: who the caller is and where the client should land.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub company_name: Option<String>,
    pub default_route: String,
}

/// StatusCounts
///
/// Number of leads per pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatusCounts {
    pub new: usize,
    pub contacted: usize,
    pub qualified: usize,
    pub follow_up: usize,
    pub won: usize,
    pub lost: usize,
}

impl StatusCounts {
    pub fn get(&self, status: LeadStatus) -> usize {
        match status {
            LeadStatus::New => self.new,
            LeadStatus::Contacted => self.contacted,
            LeadStatus::Qualified => self.qualified,
            LeadStatus::FollowUp => self.follow_up,
            LeadStatus::Won => self.won,
            LeadStatus::Lost => self.lost,
        }
    }

    pub fn total(&self) -> usize {
        LeadStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// PipelineView
///
/// Output of `GET /leads`: the filtered leads plus counts over the whole company set.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PipelineView {
    pub leads: Vec<Lead>,
    pub counts: StatusCounts,
}

/// DashboardStats
///
/// Output of `GET /owner/dashboard` for one time window.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub window: TimeWindow,
    pub total_leads: usize,
    pub won_leads: usize,
    pub lost_leads: usize,
    pub win_percentage: u32,
    pub lost_percentage: u32,
    pub recent_leads: Vec<Lead>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ShareLinkResponse {
    pub url: String,
}

/// PublicFormInfo
///
/// What an anonymous visitor of a share link sees about the link owner.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublicFormInfo {
    pub uid: String,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}
