//! Check routine behavior as seen by service methods.

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use async_trait::async_trait;
use gatekeep_audit::{AuditLog, AuditOutcome, MemoryAuditSink};
use gatekeep_authorization::Authorizer;
use gatekeep_core::{
    AuthzError, AuthzResult, DenialReason, Principal, Privilege, RequestContext, SecurableKind,
    SecurableRef,
};
use gatekeep_grants::{Grant, GrantStore, InMemoryGrantStore};
use std::sync::Arc;

struct Harness {
    authz: Authorizer,
    store: Arc<InMemoryGrantStore>,
    sink: Arc<MemoryAuditSink>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryGrantStore::new());
    let sink = Arc::new(MemoryAuditSink::new());
    let audit = Arc::new(AuditLog::new(sink.clone()).with_tracing_mirror(false));
    Harness {
        authz: Authorizer::new(store.clone(), audit),
        store,
        sink,
    }
}

fn events_table() -> SecurableRef {
    SecurableRef::resolved(SecurableKind::Table, "tbl-42", "events")
}

struct DownStore;

#[async_trait]
impl GrantStore for DownStore {
    async fn has_privilege(
        &self,
        _principal: &str,
        _kind: SecurableKind,
        _id: &str,
        _privilege: Privilege,
    ) -> AuthzResult<bool> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn is_admin(&self, _principal: &str) -> AuthzResult<bool> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn add_grant(&self, _grant: Grant) -> AuthzResult<()> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn remove_grant(&self, _grant: &Grant) -> AuthzResult<()> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn remove_grants_on(&self, _kind: SecurableKind, _id: &str) -> AuthzResult<usize> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn set_admin(&self, _principal: &str, _is_admin: bool) -> AuthzResult<()> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn grants_for(&self, _principal: &str) -> AuthzResult<Vec<Grant>> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn add_member(&self, _member: &str, _group: &str) -> AuthzResult<()> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn remove_member(&self, _member: &str, _group: &str) -> AuthzResult<()> {
        Err(AuthzError::store_unavailable("connection refused"))
    }

    async fn groups_of(&self, _principal: &str) -> AuthzResult<Vec<String>> {
        Err(AuthzError::store_unavailable("connection refused"))
    }
}

#[tokio::test]
async fn denial_writes_exactly_one_matching_record() {
    let h = harness();
    let ctx = RequestContext::new(Principal::user("alice"));

    let err = h
        .authz
        .require_privilege(
            &ctx,
            "createSchema",
            SecurableRef::catalog_param("sales"),
            Privilege::CreateSchema,
        )
        .await
        .unwrap_err();

    let denial = err.denial().unwrap();
    assert_eq!(denial.principal, "alice");
    assert_eq!(denial.privilege, Some(Privilege::CreateSchema));

    let records = h.sink.denials();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].actor, "alice");
    assert_eq!(records[0].operation, "createSchema");
    assert_eq!(records[0].target, "catalog:sales");
    assert_eq!(records[0].outcome, AuditOutcome::Denied);
}

#[tokio::test]
async fn allowed_checks_write_nothing() {
    let h = harness();
    let sales = SecurableRef::catalog_param("sales");
    h.store
        .grant(Grant::on("alice", &sales, Privilege::CreateSchema));
    let ctx = RequestContext::new(Principal::user("alice"));

    h.authz
        .require_privilege(&ctx, "createSchema", sales, Privilege::CreateSchema)
        .await
        .unwrap();
    assert!(h.sink.is_empty());
}

#[tokio::test]
async fn group_grant_satisfies_a_member_check() {
    let h = harness();
    let sales = SecurableRef::catalog_param("sales");
    h.store
        .grant(Grant::on("analysts", &sales, Privilege::CreateSchema));
    h.store.add_member("alice", "analysts").await.unwrap();
    let ctx = RequestContext::new(Principal::user("alice"));

    h.authz
        .require_privilege(&ctx, "createSchema", sales.clone(), Privilege::CreateSchema)
        .await
        .unwrap();

    h.store.remove_member("alice", "analysts").await.unwrap();
    let err = h
        .authz
        .require_privilege(&ctx, "createSchema", sales, Privilege::CreateSchema)
        .await
        .unwrap_err();
    assert_matches!(err, AuthzError::AccessDenied(_));
    assert_eq!(h.sink.denials().len(), 1);
}

#[tokio::test]
async fn sentinel_and_parameter_read_the_same_catalog_grant() {
    let h = harness();
    h.store.grant(Grant::new(
        "alice",
        SecurableKind::Catalog,
        "sales",
        Privilege::CreateVolume,
    ));
    let alice = Principal::user("alice");

    assert!(h
        .authz
        .has_privilege(
            &alice,
            &SecurableRef::catalog_sentinel("sales"),
            Privilege::CreateVolume
        )
        .await
        .unwrap());
    assert!(!h
        .authz
        .has_privilege(
            &alice,
            &SecurableRef::catalog_sentinel("finance"),
            Privilege::CreateVolume
        )
        .await
        .unwrap());
}

#[tokio::test]
async fn resolved_denial_names_the_object_not_its_parent() {
    let h = harness();
    h.store.grant(Grant::new(
        "alice",
        SecurableKind::Schema,
        "sch-7",
        Privilege::Modify,
    ));
    let ctx = RequestContext::new(Principal::user("alice"));

    let err = h
        .authz
        .require_privilege(&ctx, "updateTable", events_table(), Privilege::Modify)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Access denied: alice lacks MODIFY on table:events"
    );
    assert_eq!(h.sink.denials()[0].target, "table:events");
}

#[tokio::test]
async fn admin_only_ignores_ordinary_grants() {
    let h = harness();
    h.store
        .grant(Grant::on("carol", &events_table(), Privilege::Manage));
    let ctx = RequestContext::new(Principal::user("carol"));

    let err = h
        .authz
        .require_admin(&ctx, "createGrant", events_table())
        .await
        .unwrap_err();
    assert_eq!(
        err.denial().map(|d| d.reason),
        Some(DenialReason::AdminRequired)
    );
    assert_eq!(h.sink.denials().len(), 1);

    let admin = RequestContext::new(Principal::admin("bob"));
    h.authz
        .require_admin(&admin, "createGrant", events_table())
        .await
        .unwrap();
}

#[tokio::test]
async fn owner_bypasses_and_others_fall_back_to_grants() {
    let h = harness();
    let sales = SecurableRef::catalog_param("sales");
    let owner = RequestContext::new(Principal::user("alice"));
    h.authz
        .require_owner_or_privilege(&owner, "deleteCatalog", sales.clone(), Some("alice"), Privilege::Manage)
        .await
        .unwrap();

    h.store.grant(Grant::on("dave", &sales, Privilege::Modify));
    let dave = RequestContext::new(Principal::user("dave"));
    h.authz
        .require_owner_or_privilege(&dave, "updateCatalog", sales.clone(), Some("alice"), Privilege::Modify)
        .await
        .unwrap();
    let err = h
        .authz
        .require_owner_or_privilege(&dave, "deleteCatalog", sales, Some("alice"), Privilege::Manage)
        .await
        .unwrap_err();
    assert_matches!(err, AuthzError::AccessDenied(_));
    assert_eq!(h.sink.denials().len(), 1);
}

#[tokio::test]
async fn outage_is_neither_allowed_nor_denied() {
    let sink = Arc::new(MemoryAuditSink::new());
    let audit = Arc::new(AuditLog::new(sink.clone()).with_tracing_mirror(false));
    let authz = Authorizer::new(Arc::new(DownStore), audit);
    let ctx = RequestContext::new(Principal::user("alice"));

    let err = authz
        .require_privilege(
            &ctx,
            "createSchema",
            SecurableRef::catalog_param("sales"),
            Privilege::CreateSchema,
        )
        .await
        .unwrap_err();
    assert_matches!(err, AuthzError::StoreUnavailable { .. });
    assert!(err.is_retryable());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn not_found_is_revealed_only_to_authorized_callers() {
    let h = harness();
    let missing = SecurableRef::unresolved(SecurableKind::Table, "sales.orders.ghost");

    let alice = RequestContext::new(Principal::user("alice"));
    let err = h
        .authz
        .reveal_not_found(&alice, "updateTable", missing.clone(), "sales", Privilege::Modify)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Access denied: alice lacks MODIFY on table:ghost"
    );
    assert_eq!(
        err.denial().map(|d| d.reason),
        Some(DenialReason::MissingPrivilege)
    );
    let denials = h.sink.denials();
    assert_eq!(denials.len(), 1);
    assert_eq!(denials[0].target, "table:sales.orders.ghost");
    assert!(denials[0]
        .detail
        .as_deref()
        .is_some_and(|d| d.contains("existence concealed")));

    h.store.grant(Grant::new(
        "alice",
        SecurableKind::Catalog,
        "sales",
        Privilege::Modify,
    ));
    h.authz
        .reveal_not_found(&alice, "updateTable", missing.clone(), "sales", Privilege::Modify)
        .await
        .unwrap();

    let bob = RequestContext::new(Principal::admin("bob"));
    h.authz
        .reveal_not_found(&bob, "createTable", missing, "sales", Privilege::CreateTable)
        .await
        .unwrap();
    assert_eq!(h.sink.denials().len(), 1);
}
