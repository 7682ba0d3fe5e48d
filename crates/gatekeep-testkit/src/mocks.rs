//! Collaborators that fail on demand.

use async_trait::async_trait;
use gatekeep_audit::{AuditRecord, AuditSink};
use gatekeep_core::{AuditError, AuthzError, AuthzResult, Privilege, SecurableKind};
use gatekeep_grants::{Grant, GrantStore, InMemoryGrantStore};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Grant store whose backend is down: every call is a store outage.
#[derive(Debug, Default)]
pub struct UnavailableGrantStore;

fn outage<T>() -> AuthzResult<T> {
    Err(AuthzError::store_unavailable("grant store backend unreachable"))
}

#[async_trait]
impl GrantStore for UnavailableGrantStore {
    async fn has_privilege(
        &self,
        _principal: &str,
        _kind: SecurableKind,
        _id: &str,
        _privilege: Privilege,
    ) -> AuthzResult<bool> {
        outage()
    }

    async fn is_admin(&self, _principal: &str) -> AuthzResult<bool> {
        outage()
    }

    async fn add_grant(&self, _grant: Grant) -> AuthzResult<()> {
        outage()
    }

    async fn remove_grant(&self, _grant: &Grant) -> AuthzResult<()> {
        outage()
    }

    async fn remove_grants_on(&self, _kind: SecurableKind, _id: &str) -> AuthzResult<usize> {
        outage()
    }

    async fn set_admin(&self, _principal: &str, _is_admin: bool) -> AuthzResult<()> {
        outage()
    }

    async fn grants_for(&self, _principal: &str) -> AuthzResult<Vec<Grant>> {
        outage()
    }

    async fn add_member(&self, _member: &str, _group: &str) -> AuthzResult<()> {
        outage()
    }

    async fn remove_member(&self, _member: &str, _group: &str) -> AuthzResult<()> {
        outage()
    }

    async fn groups_of(&self, _principal: &str) -> AuthzResult<Vec<String>> {
        outage()
    }
}

/// In-memory store that can be taken offline mid-test.
#[derive(Debug, Default)]
pub struct SwitchableGrantStore {
    inner: InMemoryGrantStore,
    down: AtomicBool,
}

impl SwitchableGrantStore {
    /// Online, empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying store, for seeding.
    pub fn inner(&self) -> &InMemoryGrantStore {
        &self.inner
    }

    /// Take the store offline or bring it back.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn online(&self) -> AuthzResult<()> {
        if self.down.load(Ordering::SeqCst) {
            outage()
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GrantStore for SwitchableGrantStore {
    async fn has_privilege(
        &self,
        principal: &str,
        kind: SecurableKind,
        id: &str,
        privilege: Privilege,
    ) -> AuthzResult<bool> {
        self.online()?;
        self.inner.has_privilege(principal, kind, id, privilege).await
    }

    async fn is_admin(&self, principal: &str) -> AuthzResult<bool> {
        self.online()?;
        self.inner.is_admin(principal).await
    }

    async fn add_grant(&self, grant: Grant) -> AuthzResult<()> {
        self.online()?;
        self.inner.add_grant(grant).await
    }

    async fn remove_grant(&self, grant: &Grant) -> AuthzResult<()> {
        self.online()?;
        self.inner.remove_grant(grant).await
    }

    async fn remove_grants_on(&self, kind: SecurableKind, id: &str) -> AuthzResult<usize> {
        self.online()?;
        self.inner.remove_grants_on(kind, id).await
    }

    async fn set_admin(&self, principal: &str, is_admin: bool) -> AuthzResult<()> {
        self.online()?;
        self.inner.set_admin(principal, is_admin).await
    }

    async fn grants_for(&self, principal: &str) -> AuthzResult<Vec<Grant>> {
        self.online()?;
        self.inner.grants_for(principal).await
    }

    async fn add_member(&self, member: &str, group: &str) -> AuthzResult<()> {
        self.online()?;
        self.inner.add_member(member, group).await
    }

    async fn remove_member(&self, member: &str, group: &str) -> AuthzResult<()> {
        self.online()?;
        self.inner.remove_member(member, group).await
    }

    async fn groups_of(&self, principal: &str) -> AuthzResult<Vec<String>> {
        self.online()?;
        self.inner.groups_of(principal).await
    }
}

/// Audit sink that rejects writes once broken, keeping what it accepted.
#[derive(Debug, Default)]
pub struct BreakableAuditSink {
    accepted: RwLock<Vec<AuditRecord>>,
    broken: AtomicBool,
}

impl BreakableAuditSink {
    /// Working sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start rejecting writes.
    pub fn break_sink(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    /// Records accepted so far.
    pub fn accepted(&self) -> Vec<AuditRecord> {
        self.accepted.read().clone()
    }
}

#[async_trait]
impl AuditSink for BreakableAuditSink {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(AuditError::write("audit volume is read-only"));
        }
        self.accepted.write().push(record);
        Ok(())
    }
}
