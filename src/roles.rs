use crate::{
    error::AppResult,
    models::{Role, UserRecord},
    repository::Repository,
};

/// Order in which the role collections are probed. The first hit wins, so a uid
/// registered under several roles resolves to the earliest one listed here.
pub const PROBE_ORDER: [Role; 3] = [
    Role::CompanyOwner,
    Role::MarketingManager,
    Role::SalesManager,
];

/// Roles allowed to hand out a public lead-form link.
pub const SHARE_LINK_OWNERS: [Role; 2] = [Role::CompanyOwner, Role::SalesManager];

/// resolve_role
///
/// Looks `uid` up in every role collection in `PROBE_ORDER` and returns the first
/// record found. No caching: every call hits the store.
pub async fn resolve_role(repo: &dyn Repository, uid: &str) -> AppResult<Option<UserRecord>> {
    resolve_among(repo, uid, &PROBE_ORDER).await
}

/// Same as `resolve_role`, restricted to `roles` and probed in the given order.
pub async fn resolve_among(
    repo: &dyn Repository,
    uid: &str,
    roles: &[Role],
) -> AppResult<Option<UserRecord>> {
    for role in roles {
        if let Some(record) = repo.find_user(*role, uid).await? {
            tracing::debug!(uid, collection = role.collection(), "role resolved");
            return Ok(Some(record));
        }
    }
    tracing::debug!(uid, "no role record found");
    Ok(None)
}
