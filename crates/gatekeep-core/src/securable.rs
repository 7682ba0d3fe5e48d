//! Securable kinds and references.
//!
//! A [`SecurableRef`] is the `(kind, id)` pair a check call site hands to the
//! authorizer. The identifier remembers *how* it was obtained, so the same
//! value can be logged, audited and compared against the declared contract.

use crate::mode::SecurableIdSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource kinds subject to privilege checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurableKind {
    /// Top-level container
    Catalog,
    /// Belongs to a catalog
    Schema,
    /// Belongs to a schema
    Table,
    /// Belongs to a schema
    View,
    /// Catalog-scoped file storage
    Volume,
    /// Catalog-scoped cloud credential
    StorageCredential,
    /// Catalog-scoped storage path
    ExternalLocation,
    /// Catalog-scoped compute endpoint
    ComputeEndpoint,
}

impl SecurableKind {
    /// Every kind, in declaration order.
    pub const ALL: [SecurableKind; 8] = [
        SecurableKind::Catalog,
        SecurableKind::Schema,
        SecurableKind::Table,
        SecurableKind::View,
        SecurableKind::Volume,
        SecurableKind::StorageCredential,
        SecurableKind::ExternalLocation,
        SecurableKind::ComputeEndpoint,
    ];

    /// Wire name (`storage_credential`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurableKind::Catalog => "catalog",
            SecurableKind::Schema => "schema",
            SecurableKind::Table => "table",
            SecurableKind::View => "view",
            SecurableKind::Volume => "volume",
            SecurableKind::StorageCredential => "storage_credential",
            SecurableKind::ExternalLocation => "external_location",
            SecurableKind::ComputeEndpoint => "compute_endpoint",
        }
    }

    /// Conceptual parent kind.
    ///
    /// The engine never walks this relationship; call sites pick the exact
    /// securable they mean to check.
    pub fn parent(&self) -> Option<SecurableKind> {
        match self {
            SecurableKind::Catalog => None,
            SecurableKind::Schema => Some(SecurableKind::Catalog),
            SecurableKind::Table | SecurableKind::View => Some(SecurableKind::Schema),
            SecurableKind::Volume
            | SecurableKind::StorageCredential
            | SecurableKind::ExternalLocation
            | SecurableKind::ComputeEndpoint => Some(SecurableKind::Catalog),
        }
    }

    /// Resolve a Rust variant identifier (`StorageCredential`) as written in
    /// source code.
    pub fn from_variant_ident(ident: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| format!("{kind:?}") == ident)
    }
}

impl fmt::Display for SecurableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown securable type: {s}"))
    }
}

/// Securable identifier together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum SecurableId {
    /// Catalog name taken verbatim from a request field
    CatalogNameParam(String),
    /// Stand-in for the catalog that will contain a not-yet-created object
    CatalogSentinel(String),
    /// Durable object identifier obtained through a lookup
    RuntimeResolved(String),
    /// A qualified name that could not be resolved; only used to describe denials
    Unresolved(String),
}

impl SecurableId {
    /// Identifier used as the grant key.
    pub fn as_str(&self) -> &str {
        match self {
            SecurableId::CatalogNameParam(id)
            | SecurableId::CatalogSentinel(id)
            | SecurableId::RuntimeResolved(id)
            | SecurableId::Unresolved(id) => id,
        }
    }

    /// How the identifier was obtained. `None` for unresolved names.
    pub fn source(&self) -> Option<SecurableIdSource> {
        match self {
            SecurableId::CatalogNameParam(_) => Some(SecurableIdSource::CatalogNameParam),
            SecurableId::CatalogSentinel(_) => Some(SecurableIdSource::CatalogSentinel),
            SecurableId::RuntimeResolved(_) => Some(SecurableIdSource::RuntimeResolvedObjectId),
            SecurableId::Unresolved(_) => None,
        }
    }
}

/// `(kind, id)` pair checked by the authorizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurableRef {
    kind: SecurableKind,
    id: SecurableId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl SecurableRef {
    /// Catalog addressed by a name carried in the request.
    pub fn catalog_param(catalog_name: impl Into<String>) -> Self {
        Self {
            kind: SecurableKind::Catalog,
            id: SecurableId::CatalogNameParam(catalog_name.into()),
            label: None,
        }
    }

    /// Catalog that will contain an object being created for the first time.
    pub fn catalog_sentinel(parent_catalog: impl Into<String>) -> Self {
        Self {
            kind: SecurableKind::Catalog,
            id: SecurableId::CatalogSentinel(parent_catalog.into()),
            label: None,
        }
    }

    /// Existing object whose id came back from a lookup. `label` is the
    /// object's short name, used in messages and audit targets.
    pub fn resolved(kind: SecurableKind, id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            id: SecurableId::RuntimeResolved(id.into()),
            label: Some(label.into()),
        }
    }

    /// Object named in a request that could not be resolved.
    pub fn unresolved(kind: SecurableKind, qualified_name: impl Into<String>) -> Self {
        Self {
            kind,
            id: SecurableId::Unresolved(qualified_name.into()),
            label: None,
        }
    }

    /// Same securable, rendered as `label` in messages and audit targets.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Securable kind.
    pub fn kind(&self) -> SecurableKind {
        self.kind
    }

    /// Identifier with provenance.
    pub fn id(&self) -> &SecurableId {
        &self.id
    }

    /// Grant key for this securable.
    pub fn grant_id(&self) -> &str {
        self.id.as_str()
    }

    /// Human-readable name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

impl fmt::Display for SecurableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.display_name())
    }
}
