//! Enforcement modes and identifier-resolution sources.
//!
//! Both are closed sum types: adding a variant forces the contract registry
//! and the verification harness to handle it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an operation is authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzMode {
    /// Privilege check against the grant store
    Privilege,
    /// Recorded owner bypasses; otherwise privilege check
    OwnerOrPrivilege,
    /// Only admins; never delegable through grants
    AdminOnly,
}

impl AuthzMode {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthzMode::Privilege => "privilege",
            AuthzMode::OwnerOrPrivilege => "owner_or_privilege",
            AuthzMode::AdminOnly => "admin_only",
        }
    }
}

impl fmt::Display for AuthzMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the securable identifier handed to a check comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurableIdSource {
    /// Catalog name carried verbatim in the request
    CatalogNameParam,
    /// Sentinel for the catalog that will contain a new object
    CatalogSentinel,
    /// Durable id obtained by a lookup that precedes the check
    RuntimeResolvedObjectId,
}

impl SecurableIdSource {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurableIdSource::CatalogNameParam => "catalog_name_param",
            SecurableIdSource::CatalogSentinel => "catalog_sentinel",
            SecurableIdSource::RuntimeResolvedObjectId => "runtime_resolved_object_id",
        }
    }

    /// Whether a lookup must precede the check.
    pub fn requires_lookup(&self) -> bool {
        matches!(self, SecurableIdSource::RuntimeResolvedObjectId)
    }
}

impl fmt::Display for SecurableIdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
