//! Catalog service errors.

use gatekeep_audit::{AuditOutcome, AuditedError};
use gatekeep_core::{AuditError, AuthzError, SecurableKind};

/// Error returned by every catalog service method.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// Refused, invalid check, or grant store outage
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Lookup by name found nothing
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Kind looked up
        kind: SecurableKind,
        /// Qualified name looked up
        name: String,
    },

    /// Name already taken
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// Kind being created
        kind: SecurableKind,
        /// Qualified name
        name: String,
    },

    /// Malformed request
    #[error("Invalid request: {message}")]
    Invalid {
        /// What is wrong
        message: String,
    },

    /// Audit record could not be written
    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl CatalogError {
    /// Not found by qualified name.
    pub fn not_found(kind: SecurableKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Name collision.
    pub fn already_exists(kind: SecurableKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Malformed request.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Whether this is an authorization refusal.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Authz(AuthzError::AccessDenied(_)))
    }

    /// Whether this is a not-found answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl AuditedError for CatalogError {
    fn audit_outcome(&self) -> AuditOutcome {
        if self.is_access_denied() {
            AuditOutcome::Denied
        } else {
            AuditOutcome::Failure
        }
    }
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
