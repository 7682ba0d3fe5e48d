//! Grant store interface.

use async_trait::async_trait;
use gatekeep_core::{AuthzResult, GrantSpec, Privilege, SecurableKind, SecurableRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted fact authorizing a principal to exercise a privilege on a securable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Grant {
    /// Grantee
    pub principal: String,
    /// Securable kind
    pub securable_type: SecurableKind,
    /// Securable id (catalog name for catalogs, object id otherwise)
    pub securable_id: String,
    /// Privilege
    pub privilege: Privilege,
}

impl Grant {
    /// Grant on a raw `(kind, id)` pair.
    pub fn new(
        principal: impl Into<String>,
        securable_type: SecurableKind,
        securable_id: impl Into<String>,
        privilege: Privilege,
    ) -> Self {
        Self {
            principal: principal.into(),
            securable_type,
            securable_id: securable_id.into(),
            privilege,
        }
    }

    /// Grant on the securable a check would be made against.
    pub fn on(principal: impl Into<String>, securable: &SecurableRef, privilege: Privilege) -> Self {
        Self::new(principal, securable.kind(), securable.grant_id(), privilege)
    }
}

impl From<&GrantSpec> for Grant {
    fn from(spec: &GrantSpec) -> Self {
        Self::new(
            spec.principal.clone(),
            spec.securable_type,
            spec.securable_id.clone(),
            spec.privilege,
        )
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} on {}:{}",
            self.principal, self.privilege, self.securable_type, self.securable_id
        )
    }
}

/// Authorization facts shared by every request handler.
///
/// Reads run concurrently. Each mutation is atomic: a reader sees the state
/// before or after it, never in between. Mutations are idempotent.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// True if the principal is an admin, or if it or any group it belongs
    /// to, directly or through nested groups, holds an explicit grant.
    async fn has_privilege(
        &self,
        principal: &str,
        kind: SecurableKind,
        id: &str,
        privilege: Privilege,
    ) -> AuthzResult<bool>;

    /// Whether the principal carries the admin flag.
    async fn is_admin(&self, principal: &str) -> AuthzResult<bool>;

    /// Record a grant. Adding an existing grant is a no-op.
    async fn add_grant(&self, grant: Grant) -> AuthzResult<()>;

    /// Remove a grant. Removing a missing grant is a no-op.
    async fn remove_grant(&self, grant: &Grant) -> AuthzResult<()>;

    /// Remove every grant on `(kind, id)`, whoever holds it. Returns how many
    /// were removed.
    async fn remove_grants_on(&self, kind: SecurableKind, id: &str) -> AuthzResult<usize>;

    /// Set or clear the admin flag.
    async fn set_admin(&self, principal: &str, is_admin: bool) -> AuthzResult<()>;

    /// Explicit grants held by a principal, in stable order.
    async fn grants_for(&self, principal: &str) -> AuthzResult<Vec<Grant>>;

    /// Put `member` (a principal or a group) in `group`. Idempotent.
    async fn add_member(&self, member: &str, group: &str) -> AuthzResult<()>;

    /// Take `member` out of `group`. Removing a missing edge is a no-op.
    async fn remove_member(&self, member: &str, group: &str) -> AuthzResult<()>;

    /// Every group the principal belongs to, including through nested
    /// groups, in stable order.
    async fn groups_of(&self, principal: &str) -> AuthzResult<Vec<String>>;
}
