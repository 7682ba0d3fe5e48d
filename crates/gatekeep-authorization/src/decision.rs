//! Decision values.

use gatekeep_core::Denial;
use serde::{Deserialize, Serialize};

/// Why a check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    /// Admin fast path
    Admin,
    /// Recorded owner of the securable
    Owner,
    /// Explicit grant
    Grant,
}

/// Outcome of a check. Denials carry enough context for the audit record and
/// the client-facing error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AuthzDecision {
    /// Permitted
    Allowed {
        /// Which rule permitted it
        reason: AllowReason,
    },
    /// Refused
    Denied(Denial),
}

impl AuthzDecision {
    pub(crate) fn allowed(reason: AllowReason) -> Self {
        Self::Allowed { reason }
    }

    /// Whether the check passed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// The denial, if refused.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Denied(denial) => Some(denial),
            Self::Allowed { .. } => None,
        }
    }
}
