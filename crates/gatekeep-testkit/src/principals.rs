//! Named principals used across the test suites.

use gatekeep_core::{Principal, RequestContext};

/// Non-admin with no grants unless a test adds them.
pub fn alice() -> RequestContext {
    RequestContext::new(Principal::user("alice"))
}

/// Admin by principal flag.
pub fn bob_admin() -> RequestContext {
    RequestContext::new(Principal::admin("bob"))
}

/// Non-admin, typically given `MANAGE` on something to prove it is not enough.
pub fn carol() -> RequestContext {
    RequestContext::new(Principal::user("carol"))
}

/// Any non-admin principal.
pub fn user(name: &str) -> RequestContext {
    RequestContext::new(Principal::user(name))
}
