//! In-memory grant store.
//!
//! A single `parking_lot::RwLock` guards the whole state, so every mutation
//! is applied atomically and reads proceed in parallel. Group membership is a
//! set of `(member, group)` edges; a check walks them breadth-first, so
//! cycles terminate.

use crate::store::{Grant, GrantStore};
use async_trait::async_trait;
use gatekeep_core::{AuthzResult, BootstrapConfig, MembershipSpec, Privilege, SecurableKind};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

#[derive(Debug, Default)]
struct GrantState {
    grants: BTreeSet<Grant>,
    admins: BTreeSet<String>,
    memberships: BTreeSet<(String, String)>,
}

impl GrantState {
    /// Transitive group closure of `principal`, excluding `principal` itself.
    fn groups_of(&self, principal: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut queue = VecDeque::from([principal]);
        while let Some(current) = queue.pop_front() {
            for (_, group) in self.memberships.iter().filter(|(member, _)| member == current) {
                if group != principal && found.insert(group.clone()) {
                    queue.push_back(group.as_str());
                }
            }
        }
        found
    }
}

/// Exported grant state, used to persist and restore the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSnapshot {
    /// Principals with the admin flag
    pub admins: Vec<String>,
    /// Explicit grants
    pub grants: Vec<Grant>,
    /// Group membership edges
    #[serde(default)]
    pub memberships: Vec<MembershipSpec>,
}

/// Thread-safe, in-memory grant store.
#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    state: RwLock<GrantState>,
}

impl InMemoryGrantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded from the bootstrap configuration.
    pub fn from_bootstrap(bootstrap: &BootstrapConfig) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write();
            state.admins.extend(bootstrap.admins.iter().cloned());
            state.grants.extend(bootstrap.grants.iter().map(Grant::from));
            state.memberships.extend(
                bootstrap
                    .memberships
                    .iter()
                    .map(|edge| (edge.member.clone(), edge.group.clone())),
            );
        }
        debug!(
            admins = bootstrap.admins.len(),
            grants = bootstrap.grants.len(),
            memberships = bootstrap.memberships.len(),
            "grant store seeded from bootstrap config"
        );
        store
    }

    /// Record a grant; returns whether the state changed.
    pub fn grant(&self, grant: Grant) -> bool {
        let added = self.state.write().grants.insert(grant.clone());
        debug!(grant = %grant, added, "grant added");
        added
    }

    /// Remove a grant; returns whether the state changed.
    pub fn revoke(&self, grant: &Grant) -> bool {
        let removed = self.state.write().grants.remove(grant);
        debug!(grant = %grant, removed, "grant removed");
        removed
    }

    /// Remove every grant on `(kind, id)`; returns how many went.
    pub fn revoke_all_on(&self, kind: SecurableKind, id: &str) -> usize {
        let mut state = self.state.write();
        let before = state.grants.len();
        state
            .grants
            .retain(|grant| grant.securable_type != kind || grant.securable_id != id);
        let removed = before - state.grants.len();
        debug!(%kind, id, removed, "grants on securable removed");
        removed
    }

    /// Set or clear the admin flag.
    pub fn set_admin_flag(&self, principal: &str, is_admin: bool) {
        let mut state = self.state.write();
        if is_admin {
            state.admins.insert(principal.to_string());
        } else {
            state.admins.remove(principal);
        }
    }

    /// Put `member` in `group`; returns whether the state changed.
    pub fn join_group(&self, member: &str, group: &str) -> bool {
        let added = self
            .state
            .write()
            .memberships
            .insert((member.to_string(), group.to_string()));
        debug!(member, group, added, "group member added");
        added
    }

    /// Take `member` out of `group`; returns whether the state changed.
    pub fn leave_group(&self, member: &str, group: &str) -> bool {
        let removed = self
            .state
            .write()
            .memberships
            .remove(&(member.to_string(), group.to_string()));
        debug!(member, group, removed, "group member removed");
        removed
    }

    /// Synchronous transitive group query.
    pub fn group_closure(&self, principal: &str) -> Vec<String> {
        self.state.read().groups_of(principal).into_iter().collect()
    }

    /// Synchronous privilege query: admin flag, then the principal's own
    /// grants, then those of every group it reaches.
    pub fn is_granted(
        &self,
        principal: &str,
        kind: SecurableKind,
        id: &str,
        privilege: Privilege,
    ) -> bool {
        let state = self.state.read();
        if state.admins.contains(principal) {
            return true;
        }
        let holds = |grantee: &str| {
            state
                .grants
                .contains(&Grant::new(grantee, kind, id, privilege))
        };
        holds(principal) || state.groups_of(principal).iter().any(|group| holds(group))
    }

    /// Synchronous admin query.
    pub fn is_admin_principal(&self, principal: &str) -> bool {
        self.state.read().admins.contains(principal)
    }

    /// Number of explicit grants.
    pub fn grant_count(&self) -> usize {
        self.state.read().grants.len()
    }

    /// Export the full state.
    pub fn snapshot(&self) -> GrantSnapshot {
        let state = self.state.read();
        GrantSnapshot {
            admins: state.admins.iter().cloned().collect(),
            grants: state.grants.iter().cloned().collect(),
            memberships: state
                .memberships
                .iter()
                .map(|(member, group)| MembershipSpec {
                    member: member.clone(),
                    group: group.clone(),
                })
                .collect(),
        }
    }

    /// Replace the full state with a snapshot.
    pub fn restore(&self, snapshot: GrantSnapshot) {
        let mut state = self.state.write();
        state.admins = snapshot.admins.into_iter().collect();
        state.grants = snapshot.grants.into_iter().collect();
        state.memberships = snapshot
            .memberships
            .into_iter()
            .map(|edge| (edge.member, edge.group))
            .collect();
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn has_privilege(
        &self,
        principal: &str,
        kind: SecurableKind,
        id: &str,
        privilege: Privilege,
    ) -> AuthzResult<bool> {
        Ok(self.is_granted(principal, kind, id, privilege))
    }

    async fn is_admin(&self, principal: &str) -> AuthzResult<bool> {
        Ok(self.is_admin_principal(principal))
    }

    async fn add_grant(&self, grant: Grant) -> AuthzResult<()> {
        self.grant(grant);
        Ok(())
    }

    async fn remove_grant(&self, grant: &Grant) -> AuthzResult<()> {
        self.revoke(grant);
        Ok(())
    }

    async fn remove_grants_on(&self, kind: SecurableKind, id: &str) -> AuthzResult<usize> {
        Ok(self.revoke_all_on(kind, id))
    }

    async fn set_admin(&self, principal: &str, is_admin: bool) -> AuthzResult<()> {
        self.set_admin_flag(principal, is_admin);
        Ok(())
    }

    async fn grants_for(&self, principal: &str) -> AuthzResult<Vec<Grant>> {
        Ok(self
            .state
            .read()
            .grants
            .iter()
            .filter(|grant| grant.principal == principal)
            .cloned()
            .collect())
    }

    async fn add_member(&self, member: &str, group: &str) -> AuthzResult<()> {
        self.join_group(member, group);
        Ok(())
    }

    async fn remove_member(&self, member: &str, group: &str) -> AuthzResult<()> {
        self.leave_group(member, group);
        Ok(())
    }

    async fn groups_of(&self, principal: &str) -> AuthzResult<Vec<String>> {
        Ok(self.group_closure(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeep_core::GrantSpec;

    fn schema_grant() -> Grant {
        Grant::new("alice", SecurableKind::Catalog, "sales", Privilege::CreateSchema)
    }

    #[test]
    fn grant_then_revoke() {
        let store = InMemoryGrantStore::new();
        assert!(store.grant(schema_grant()));
        assert!(store.is_granted(
            "alice",
            SecurableKind::Catalog,
            "sales",
            Privilege::CreateSchema
        ));
        assert!(store.revoke(&schema_grant()));
        assert!(!store.is_granted(
            "alice",
            SecurableKind::Catalog,
            "sales",
            Privilege::CreateSchema
        ));
    }

    #[test]
    fn grants_do_not_leak_across_securables() {
        let store = InMemoryGrantStore::new();
        store.grant(schema_grant());
        assert!(!store.is_granted(
            "alice",
            SecurableKind::Catalog,
            "marketing",
            Privilege::CreateSchema
        ));
        assert!(!store.is_granted(
            "alice",
            SecurableKind::Catalog,
            "sales",
            Privilege::CreateVolume
        ));
        assert!(!store.is_granted(
            "bob",
            SecurableKind::Catalog,
            "sales",
            Privilege::CreateSchema
        ));
    }

    #[test]
    fn bootstrap_seeds_admins_and_grants() {
        let bootstrap = BootstrapConfig {
            admins: vec!["bob".to_string()],
            catalogs: vec![],
            grants: vec![GrantSpec {
                principal: "alice".to_string(),
                securable_type: SecurableKind::Catalog,
                securable_id: "sales".to_string(),
                privilege: Privilege::CreateSchema,
            }],
            memberships: vec![MembershipSpec {
                member: "carol".to_string(),
                group: "analysts".to_string(),
            }],
        };
        let store = InMemoryGrantStore::from_bootstrap(&bootstrap);
        assert!(store.is_admin_principal("bob"));
        assert_eq!(store.grant_count(), 1);
        assert_eq!(store.group_closure("carol"), vec!["analysts".to_string()]);
    }

    #[test]
    fn snapshot_restores_exact_state() {
        let store = InMemoryGrantStore::new();
        store.grant(schema_grant());
        store.set_admin_flag("bob", true);
        let snapshot = store.snapshot();

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: GrantSnapshot = serde_json::from_str(&json).unwrap();

        let other = InMemoryGrantStore::new();
        other.grant(Grant::new(
            "mallory",
            SecurableKind::Table,
            "t-9",
            Privilege::Manage,
        ));
        other.restore(restored);
        assert_eq!(other.snapshot(), snapshot);
    }

    #[test]
    fn revoke_all_on_only_touches_that_securable() {
        let store = InMemoryGrantStore::new();
        store.grant(schema_grant());
        store.grant(Grant::new("bob", SecurableKind::Catalog, "sales", Privilege::Manage));
        store.grant(Grant::new("bob", SecurableKind::Catalog, "marketing", Privilege::Manage));
        store.grant(Grant::new("bob", SecurableKind::Schema, "sales", Privilege::Manage));

        assert_eq!(store.revoke_all_on(SecurableKind::Catalog, "sales"), 2);
        assert_eq!(store.grant_count(), 2);
        assert_eq!(store.revoke_all_on(SecurableKind::Catalog, "sales"), 0);
    }

    #[test]
    fn nested_group_grants_reach_members() {
        let store = InMemoryGrantStore::new();
        store.grant(Grant::new(
            "data-eng",
            SecurableKind::Catalog,
            "sales",
            Privilege::CreateSchema,
        ));
        store.join_group("alice", "analysts");
        store.join_group("analysts", "data-eng");
        assert!(store.is_granted("alice", SecurableKind::Catalog, "sales", Privilege::CreateSchema));

        store.leave_group("analysts", "data-eng");
        assert!(!store.is_granted("alice", SecurableKind::Catalog, "sales", Privilege::CreateSchema));
    }

    #[test]
    fn membership_cycles_terminate() {
        let store = InMemoryGrantStore::new();
        store.join_group("a", "b");
        store.join_group("b", "c");
        store.join_group("c", "a");
        assert_eq!(store.group_closure("a"), vec!["b".to_string(), "c".to_string()]);
        assert!(!store.is_granted("a", SecurableKind::Catalog, "sales", Privilege::Manage));
    }

    #[tokio::test]
    async fn trait_lists_only_the_principals_grants() {
        let store = InMemoryGrantStore::new();
        store.add_grant(schema_grant()).await.unwrap();
        store
            .add_grant(Grant::new(
                "carol",
                SecurableKind::Table,
                "t-1",
                Privilege::Manage,
            ))
            .await
            .unwrap();
        let grants = store.grants_for("alice").await.unwrap();
        assert_eq!(grants, vec![schema_grant()]);
    }
}
