//! Property tests for the grant store: admin bypass, idempotence, default deny,
//! group inheritance, and atomicity under concurrent readers.

#![allow(clippy::unwrap_used)]

use gatekeep_core::{Privilege, SecurableKind};
use gatekeep_grants::{Grant, InMemoryGrantStore};
use proptest::prelude::*;
use std::sync::Arc;

fn arb_kind() -> impl Strategy<Value = SecurableKind> {
    prop::sample::select(SecurableKind::ALL.to_vec())
}

fn arb_privilege() -> impl Strategy<Value = Privilege> {
    prop::sample::select(Privilege::ALL.to_vec())
}

fn arb_grant() -> impl Strategy<Value = Grant> {
    (
        "[a-z]{1,6}",
        arb_kind(),
        "[a-z0-9]{1,8}",
        arb_privilege(),
    )
        .prop_map(|(principal, kind, id, privilege)| Grant::new(principal, kind, id, privilege))
}

proptest! {
    /// Admins hold every privilege on every securable without explicit grants.
    #[test]
    fn admin_bypass(kind in arb_kind(), id in "[a-z0-9]{1,8}", privilege in arb_privilege()) {
        let store = InMemoryGrantStore::new();
        store.set_admin_flag("bob", true);
        prop_assert!(store.is_granted("bob", kind, &id, privilege));
    }

    /// A principal with no matching grant is refused everything.
    #[test]
    fn default_deny(
        grants in prop::collection::vec(arb_grant(), 0..16),
        kind in arb_kind(),
        id in "[a-z0-9]{1,8}",
        privilege in arb_privilege(),
    ) {
        let store = InMemoryGrantStore::new();
        for grant in grants {
            // Nobody else's grants may leak to the probe principal
            if grant.principal != "probe" {
                store.grant(grant);
            }
        }
        prop_assert!(!store.is_granted("probe", kind, &id, privilege));
    }

    /// Adding twice equals adding once; removing a missing grant changes nothing.
    #[test]
    fn grant_idempotence(grants in prop::collection::vec(arb_grant(), 1..16)) {
        let once = InMemoryGrantStore::new();
        let twice = InMemoryGrantStore::new();
        for grant in &grants {
            once.grant(grant.clone());
            twice.grant(grant.clone());
            twice.grant(grant.clone());
        }
        prop_assert_eq!(once.snapshot(), twice.snapshot());

        let before = once.snapshot();
        prop_assert!(!once.revoke(&Grant::new("nobody", SecurableKind::View, "v", Privilege::Modify)));
        prop_assert_eq!(once.snapshot(), before);
    }

    /// A member inherits every grant of every group on its membership chain,
    /// and loses it when the chain is cut.
    #[test]
    fn members_inherit_group_grants(
        depth in 1usize..5,
        kind in arb_kind(),
        id in "[a-z0-9]{1,8}",
        privilege in arb_privilege(),
    ) {
        let store = InMemoryGrantStore::new();
        let chain: Vec<String> = (0..depth).map(|level| format!("group{level}")).collect();
        store.join_group("member", &chain[0]);
        for pair in chain.windows(2) {
            store.join_group(&pair[0], &pair[1]);
        }
        let top = &chain[depth - 1];
        store.grant(Grant::new(top.clone(), kind, id.clone(), privilege));

        prop_assert!(store.is_granted("member", kind, &id, privilege));
        prop_assert_eq!(store.group_closure("member"), chain.clone());
        let other_id = format!("{id}x");
        prop_assert!(!store.is_granted(top, kind, &other_id, privilege));

        store.leave_group("member", &chain[0]);
        prop_assert!(!store.is_granted("member", kind, &id, privilege));
    }
}

#[test]
fn concurrent_readers_never_see_half_applied_snapshots() {
    let store = Arc::new(InMemoryGrantStore::new());
    let first = Grant::new("alice", SecurableKind::Catalog, "sales", Privilege::CreateSchema);
    let second = Grant::new("alice", SecurableKind::Catalog, "sales", Privilege::CreateVolume);

    let writer = {
        let store = Arc::clone(&store);
        let (first, second) = (first.clone(), second.clone());
        std::thread::spawn(move || {
            for _ in 0..500 {
                store.restore(gatekeep_grants::GrantSnapshot {
                    admins: vec![],
                    grants: vec![first.clone(), second.clone()],
                    memberships: vec![],
                });
                store.restore(gatekeep_grants::GrantSnapshot::default());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    let count = store.snapshot().grants.len();
                    assert!(count == 0 || count == 2, "observed partial state: {count}");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}
