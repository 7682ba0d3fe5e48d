//! Error taxonomy for authorization.
//!
//! "Not granted" is never an error at the grant-store level; it only becomes
//! [`AuthzError::AccessDenied`] once the check routine has decided and
//! audited. Store outages stay distinct so nothing can fail open.

use crate::privilege::Privilege;
use crate::securable::SecurableRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a check was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No grant for the required privilege and not an admin
    MissingPrivilege,
    /// Operation is admin-only and the caller is not an admin
    AdminRequired,
    /// Caller is not the recorded owner and lacks the fallback privilege
    NotOwner,
}

/// Structured context of a refused check.
///
/// Carries enough to write the denial audit record and to tell a legitimate
/// caller which privilege on which securable was required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    /// Refused principal
    pub principal: String,
    /// Securable the check was made against
    pub securable: SecurableRef,
    /// Required privilege; `None` for admin-only checks
    pub privilege: Option<Privilege>,
    /// Reason
    pub reason: DenialReason,
}

impl Denial {
    /// Denial for a missing privilege.
    pub fn missing_privilege(
        principal: impl Into<String>,
        securable: SecurableRef,
        privilege: Privilege,
    ) -> Self {
        Self {
            principal: principal.into(),
            securable,
            privilege: Some(privilege),
            reason: DenialReason::MissingPrivilege,
        }
    }

    /// Denial for an admin-only operation.
    pub fn admin_required(principal: impl Into<String>, target: SecurableRef) -> Self {
        Self {
            principal: principal.into(),
            securable: target,
            privilege: None,
            reason: DenialReason::AdminRequired,
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.reason, self.privilege) {
            (DenialReason::AdminRequired, _) | (_, None) => write!(
                f,
                "{} is not an admin; admin required on {}",
                self.principal, self.securable
            ),
            (DenialReason::NotOwner, Some(privilege)) => write!(
                f,
                "{} is not the owner of {} and lacks {}",
                self.principal, self.securable, privilege
            ),
            (DenialReason::MissingPrivilege, Some(privilege)) => {
                write!(
                    f,
                    "{} lacks {} on {}",
                    self.principal, privilege, self.securable
                )
            }
        }
    }
}

/// Audit sink failures. Lost audit records are a correctness defect, so these
/// propagate like any other error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// The asynchronous writer has shut down
    #[error("Audit sink closed")]
    SinkClosed,
    /// The sink refused the record
    #[error("Audit write failed: {message}")]
    Write {
        /// Error message from the sink
        message: String,
    },
}

impl AuditError {
    /// Create a write error
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }
}

/// Errors produced by the authorization check routine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthzError {
    /// Expected, audited refusal; surfaced to clients as 403
    #[error("Access denied: {0}")]
    AccessDenied(Box<Denial>),

    /// The call site asked for a nonsensical privilege/securable pair
    #[error("Invalid authorization request: {message}")]
    Validation {
        /// Error message describing the invalid combination
        message: String,
    },

    /// The grant store could not answer; retryable by the caller
    #[error("Grant store unavailable: {message}")]
    StoreUnavailable {
        /// Error message from the store
        message: String,
    },

    /// A denial could not be audited
    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl AuthzError {
    /// Create an access denied error
    pub fn access_denied(denial: Denial) -> Self {
        Self::AccessDenied(Box::new(denial))
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a store unavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Denial context when this is an access denied error.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::AccessDenied(denial) => Some(denial),
            _ => None,
        }
    }

    /// Whether a caller may retry with backoff. The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Result type for authorization operations
pub type AuthzResult<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::securable::{SecurableKind, SecurableRef};

    #[test]
    fn access_denied_names_privilege_and_securable() {
        let err = AuthzError::access_denied(Denial::missing_privilege(
            "alice",
            SecurableRef::catalog_param("sales"),
            Privilege::CreateSchema,
        ));
        assert_eq!(
            err.to_string(),
            "Access denied: alice lacks CREATE_SCHEMA on catalog:sales"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn admin_denial_message() {
        let denial = Denial::admin_required(
            "carol",
            SecurableRef::resolved(SecurableKind::Table, "t-1", "events"),
        );
        assert_eq!(
            denial.to_string(),
            "carol is not an admin; admin required on table:events"
        );
    }

    #[test]
    fn only_store_outages_are_retryable() {
        assert!(AuthzError::store_unavailable("connection reset").is_retryable());
        assert!(!AuthzError::validation("bad pair").is_retryable());
        assert!(!AuthzError::from(AuditError::SinkClosed).is_retryable());
    }
}
