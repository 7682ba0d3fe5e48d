//! Principals and request context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller identity established upstream from the request's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Principal name, the key grants are issued against
    pub name: String,
    /// Admin flag set by the session layer
    pub is_admin: bool,
}

impl Principal {
    /// Ordinary principal.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_admin: false,
        }
    }

    /// Admin principal.
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_admin: true,
        }
    }
}

/// Request-scoped context handed to every service method.
#[derive(Debug, Clone)]
pub struct RequestContext {
    principal: Principal,
    request_id: Uuid,
}

impl RequestContext {
    /// Context for a fresh request.
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            request_id: Uuid::new_v4(),
        }
    }

    /// Context for the engine itself (startup, reconciliation).
    pub fn system() -> Self {
        Self::new(Principal::admin("system"))
    }

    /// Calling principal.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Request correlation id, copied onto every audit record.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}
