#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use lead_pipeline::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    error::{AppError, AppResult},
    identity::{IdentityState, MockIdentityProvider},
    models::{Lead, LeadStatus, Role, UserRecord},
    pipeline::{self, StatusUpdate},
    repository::{Repository, RepositoryState},
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// --- In-memory Repository ---

/// Behaves like the Postgres repository, including the status guard on updates.
#[derive(Default)]
pub struct MemoryRepo {
    users: Mutex<Vec<UserRecord>>,
    leads: Mutex<Vec<Lead>>,
    /// Makes every status update lose its race, as if another user got there first.
    pub lose_status_races: bool,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn losing_status_races() -> Self {
        Self {
            lose_status_races: true,
            ..Self::default()
        }
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let repo = Self::new();
        for user in users {
            repo.add_user(user);
        }
        repo
    }

    pub fn add_user(&self, user: UserRecord) {
        self.users.lock().unwrap().push(user);
    }

    pub fn add_lead(&self, lead: Lead) {
        self.leads.lock().unwrap().push(lead);
    }

    pub fn lead(&self, id: Uuid) -> Option<Lead> {
        self.leads.lock().unwrap().iter().find(|l| l.id == id).cloned()
    }

    pub fn users(&self) -> Vec<UserRecord> {
        self.users.lock().unwrap().clone()
    }

    pub fn lead_count(&self) -> usize {
        self.leads.lock().unwrap().len()
    }
}

#[async_trait]
impl Repository for MemoryRepo {
    async fn find_user(&self, role: Role, uid: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.role == role && u.uid == uid)
            .cloned())
    }

    async fn insert_user(&self, user: UserRecord) -> AppResult<UserRecord> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.role == user.role && u.uid == user.uid) {
            return Err(AppError::Conflict("duplicate uid".to_string()));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn company_has_owner(&self, company_name: &str) -> AppResult<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.role == Role::CompanyOwner && u.company_name == company_name))
    }

    async fn list_users_by_company(
        &self,
        role: Role,
        company_name: &str,
    ) -> AppResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.role == role && u.company_name == company_name)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn insert_lead(&self, lead: Lead) -> AppResult<Lead> {
        self.leads.lock().unwrap().push(lead.clone());
        Ok(lead)
    }

    async fn get_lead(&self, id: Uuid) -> AppResult<Option<Lead>> {
        Ok(self.lead(id))
    }

    async fn list_company_leads(&self, company: &str) -> AppResult<Vec<Lead>> {
        let mut leads: Vec<Lead> = self
            .leads
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.submitted_lead == company)
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    async fn list_follow_ups_due(&self, company: &str, day: NaiveDate) -> AppResult<Vec<Lead>> {
        let leads = self.list_company_leads(company).await?;
        Ok(pipeline::due_follow_ups(&leads, day))
    }

    async fn update_lead_status(
        &self,
        id: Uuid,
        update: &StatusUpdate,
    ) -> AppResult<Option<Lead>> {
        if self.lose_status_races {
            return Ok(None);
        }
        let mut leads = self.leads.lock().unwrap();
        let Some(lead) = leads
            .iter_mut()
            .find(|l| l.id == id && l.status == update.from)
        else {
            return Ok(None);
        };
        lead.status = update.to;
        if let Some(date) = update.follow_up_date {
            lead.follow_up_date = Some(date);
        }
        lead.updated_at = Utc::now();
        Ok(Some(lead.clone()))
    }

    async fn set_follow_up_date(&self, id: Uuid, date: NaiveDate) -> AppResult<Option<Lead>> {
        let mut leads = self.leads.lock().unwrap();
        let Some(lead) = leads
            .iter_mut()
            .find(|l| l.id == id && l.status == LeadStatus::FollowUp)
        else {
            return Ok(None);
        };
        lead.follow_up_date = Some(date);
        lead.updated_at = Utc::now();
        Ok(Some(lead.clone()))
    }
}

// --- Fixtures ---

pub fn user(uid: &str, role: Role, company: &str) -> UserRecord {
    UserRecord {
        uid: uid.to_string(),
        name: format!("{} name", uid),
        email: format!("{}@example.com", uid),
        phone: "555-0100".to_string(),
        role,
        company_name: company.to_string(),
        created_at: Utc::now(),
    }
}

pub fn lead(company: &str, status: LeadStatus, created_at: DateTime<Utc>) -> Lead {
    Lead {
        id: Uuid::new_v4(),
        name: "Jane Prospect".to_string(),
        email: "jane@prospect.io".to_string(),
        phone: "555-0199".to_string(),
        company: "Prospect Inc".to_string(),
        status,
        submitted_lead: company.to_string(),
        created_by: "seed".to_string(),
        created_at,
        updated_at: created_at,
        ..Lead::default()
    }
}

pub fn lead_aged(company: &str, status: LeadStatus, age: Duration) -> Lead {
    lead(company, status, Utc::now() - age)
}

pub fn follow_up(company: &str, date: NaiveDate) -> Lead {
    Lead {
        follow_up_date: Some(date),
        ..lead(company, LeadStatus::FollowUp, Utc::now())
    }
}

pub fn auth_user(record: &UserRecord) -> AuthUser {
    AuthUser {
        uid: record.uid.clone(),
        email: Some(record.email.clone()),
        display_name: Some(record.name.clone()),
        record: Some(record.clone()),
    }
}

/// A signed-in user without any role record.
pub fn roleless_user(uid: &str) -> AuthUser {
    AuthUser {
        uid: uid.to_string(),
        email: Some(format!("{}@example.com", uid)),
        display_name: Some("New Person".to_string()),
        record: None,
    }
}

pub fn state(repo: Arc<MemoryRepo>) -> AppState {
    state_with(repo, MockIdentityProvider::new(), AppConfig::default())
}

pub fn state_with(
    repo: Arc<MemoryRepo>,
    identity: MockIdentityProvider,
    config: AppConfig,
) -> AppState {
    AppState {
        repo: repo as RepositoryState,
        identity: Arc::new(identity) as IdentityState,
        config,
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
