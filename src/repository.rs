use crate::{
    error::{AppError, AppResult},
    models::{FormSource, Lead, LeadStatus, Priority, Role, UserRecord},
    pipeline::StatusUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for all persistence operations, so handlers never see the
/// concrete store. Shared across tasks as `Arc<dyn Repository>`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    /// Looks a uid up in a single role collection.
    async fn find_user(&self, role: Role, uid: &str) -> AppResult<Option<UserRecord>>;
    async fn insert_user(&self, user: UserRecord) -> AppResult<UserRecord>;
    /// True when at least one Company Owner is registered under `company_name`.
    async fn company_has_owner(&self, company_name: &str) -> AppResult<bool>;
    async fn list_users_by_company(
        &self,
        role: Role,
        company_name: &str,
    ) -> AppResult<Vec<UserRecord>>;

    // --- Leads ---
    async fn insert_lead(&self, lead: Lead) -> AppResult<Lead>;
    async fn get_lead(&self, id: Uuid) -> AppResult<Option<Lead>>;
    /// Every lead submitted under `company`, newest first.
    async fn list_company_leads(&self, company: &str) -> AppResult<Vec<Lead>>;
    /// Follow-Up leads of `company` due on `day`.
    async fn list_follow_ups_due(&self, company: &str, day: NaiveDate) -> AppResult<Vec<Lead>>;
    /// Applies `update` only while the lead still has `update.from`.
    /// Returns `None` when the lead is missing or has moved on.
    async fn update_lead_status(
        &self,
        id: Uuid,
        update: &StatusUpdate,
    ) -> AppResult<Option<Lead>>;
    /// Moves the follow-up date of a lead that is still in Follow-Up.
    async fn set_follow_up_date(&self, id: Uuid, date: NaiveDate) -> AppResult<Option<Lead>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Row mapping ---

#[derive(FromRow)]
struct UserRow {
    uid: String,
    name: String,
    email: String,
    phone: String,
    role: String,
    company_name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| AppError::Internal(format!("unknown role '{}' stored", row.role)))?;
        Ok(UserRecord {
            uid: row.uid,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role,
            company_name: row.company_name,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct LeadRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    company: String,
    address: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    services: String,
    budget: String,
    timeline: String,
    source: String,
    notes: String,
    priority: String,
    status: String,
    follow_up_date: Option<NaiveDate>,
    submitted_lead: String,
    created_by: String,
    created_by_email: Option<String>,
    form_source: String,
    shared_by: Option<String>,
    link_owner: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = AppError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = move |field: &str, value: &str| {
            AppError::Internal(format!("lead {}: unknown {} '{}'", id, field, value))
        };
        let priority =
            Priority::parse(&row.priority).ok_or_else(|| corrupt("priority", &row.priority))?;
        let status =
            LeadStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?;
        let form_source = FormSource::parse(&row.form_source)
            .ok_or_else(|| corrupt("form source", &row.form_source))?;
        let shared_by = match row.shared_by.as_deref() {
            Some(value) => Some(Role::parse(value).ok_or_else(|| corrupt("role", value))?),
            None => None,
        };

        Ok(Lead {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            country: row.country,
            services: row.services,
            budget: row.budget,
            timeline: row.timeline,
            source: row.source,
            notes: row.notes,
            priority,
            status,
            follow_up_date: row.follow_up_date,
            submitted_lead: row.submitted_lead,
            created_by: row.created_by,
            created_by_email: row.created_by_email,
            form_source,
            shared_by,
            link_owner: row.link_owner,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "uid, name, email, phone, role, company_name, created_at";

const LEAD_COLUMNS: &str = "id, name, email, phone, company, address, city, state, zip_code, \
    country, services, budget, timeline, source, notes, priority, status, follow_up_date, \
    submitted_lead, created_by, created_by_email, form_source, shared_by, link_owner, \
    created_at, updated_at";

fn into_leads(rows: Vec<LeadRow>) -> AppResult<Vec<Lead>> {
    rows.into_iter().map(Lead::try_from).collect()
}

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Role collections are the `company_owner`,
/// `marketing_manager` and `sales_manager` tables; leads live in `leads`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user(&self, role: Role, uid: &str) -> AppResult<Option<UserRecord>> {
        // Table names come from the closed `Role` enum, never from input.
        let sql = format!(
            "SELECT {} FROM {} WHERE uid = $1",
            USER_COLUMNS,
            role.collection()
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRecord::try_from).transpose()
    }

    async fn insert_user(&self, user: UserRecord) -> AppResult<UserRecord> {
        let sql = format!(
            "INSERT INTO {} ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {cols}",
            user.role.collection(),
            cols = USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.uid)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(user.role.as_str())
            .bind(&user.company_name)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await?;
        UserRecord::try_from(row)
    }

    async fn company_has_owner(&self, company_name: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM company_owner WHERE company_name = $1)",
        )
        .bind(company_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_users_by_company(
        &self,
        role: Role,
        company_name: &str,
    ) -> AppResult<Vec<UserRecord>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE company_name = $1 ORDER BY created_at ASC",
            USER_COLUMNS,
            role.collection()
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(company_name)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn insert_lead(&self, lead: Lead) -> AppResult<Lead> {
        let sql = format!(
            "INSERT INTO leads ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, \
             $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26) \
             RETURNING {cols}",
            cols = LEAD_COLUMNS
        );
        let row = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(lead.id)
            .bind(&lead.name)
            .bind(&lead.email)
            .bind(&lead.phone)
            .bind(&lead.company)
            .bind(&lead.address)
            .bind(&lead.city)
            .bind(&lead.state)
            .bind(&lead.zip_code)
            .bind(&lead.country)
            .bind(&lead.services)
            .bind(&lead.budget)
            .bind(&lead.timeline)
            .bind(&lead.source)
            .bind(&lead.notes)
            .bind(lead.priority.as_str())
            .bind(lead.status.as_str())
            .bind(lead.follow_up_date)
            .bind(&lead.submitted_lead)
            .bind(&lead.created_by)
            .bind(&lead.created_by_email)
            .bind(lead.form_source.as_str())
            .bind(lead.shared_by.map(|r| r.as_str()))
            .bind(&lead.link_owner)
            .bind(lead.created_at)
            .bind(lead.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Lead::try_from(row)
    }

    async fn get_lead(&self, id: Uuid) -> AppResult<Option<Lead>> {
        let sql = format!("SELECT {} FROM leads WHERE id = $1", LEAD_COLUMNS);
        let row = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Lead::try_from).transpose()
    }

    async fn list_company_leads(&self, company: &str) -> AppResult<Vec<Lead>> {
        let sql = format!(
            "SELECT {} FROM leads WHERE submitted_lead = $1 ORDER BY created_at DESC",
            LEAD_COLUMNS
        );
        let rows = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(company)
            .fetch_all(&self.pool)
            .await?;
        into_leads(rows)
    }

    async fn list_follow_ups_due(&self, company: &str, day: NaiveDate) -> AppResult<Vec<Lead>> {
        let sql = format!(
            "SELECT {} FROM leads \
             WHERE submitted_lead = $1 AND status = $2 AND follow_up_date = $3 \
             ORDER BY created_at DESC",
            LEAD_COLUMNS
        );
        let rows = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(company)
            .bind(LeadStatus::FollowUp.as_str())
            .bind(day)
            .fetch_all(&self.pool)
            .await?;
        into_leads(rows)
    }

    async fn update_lead_status(
        &self,
        id: Uuid,
        update: &StatusUpdate,
    ) -> AppResult<Option<Lead>> {
        // The status guard in the WHERE clause keeps a concurrent change from being
        // overwritten by a stale transition.
        let sql = format!(
            "UPDATE leads \
             SET status = $3, follow_up_date = COALESCE($4, follow_up_date), updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {}",
            LEAD_COLUMNS
        );
        let row = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(id)
            .bind(update.from.as_str())
            .bind(update.to.as_str())
            .bind(update.follow_up_date)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Lead::try_from).transpose()
    }

    async fn set_follow_up_date(&self, id: Uuid, date: NaiveDate) -> AppResult<Option<Lead>> {
        let sql = format!(
            "UPDATE leads SET follow_up_date = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {}",
            LEAD_COLUMNS
        );
        let row = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(id)
            .bind(LeadStatus::FollowUp.as_str())
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Lead::try_from).transpose()
    }
}
