//! Privilege taxonomy.

use crate::securable::SecurableKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named capability checked against a principal and a securable.
///
/// `Modify` and `Manage` apply to any existing securable. The `Create*`
/// privileges (and `ManageCompute`) are granted on the parent and checked
/// before the child exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Privilege {
    /// Create schemas in a catalog
    CreateSchema,
    /// Create tables in a schema
    CreateTable,
    /// Create views in a schema
    CreateView,
    /// Create volumes in a catalog
    CreateVolume,
    /// Register storage credentials in a catalog
    CreateStorageCredential,
    /// Register external locations in a catalog
    CreateExternalLocation,
    /// Create, change and assign compute endpoints
    ManageCompute,
    /// Update an existing securable
    Modify,
    /// Delete or administer an existing securable
    Manage,
}

impl Privilege {
    /// Every privilege, in declaration order.
    pub const ALL: [Privilege; 9] = [
        Privilege::CreateSchema,
        Privilege::CreateTable,
        Privilege::CreateView,
        Privilege::CreateVolume,
        Privilege::CreateStorageCredential,
        Privilege::CreateExternalLocation,
        Privilege::ManageCompute,
        Privilege::Modify,
        Privilege::Manage,
    ];

    /// Wire name (`CREATE_SCHEMA`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Privilege::CreateSchema => "CREATE_SCHEMA",
            Privilege::CreateTable => "CREATE_TABLE",
            Privilege::CreateView => "CREATE_VIEW",
            Privilege::CreateVolume => "CREATE_VOLUME",
            Privilege::CreateStorageCredential => "CREATE_STORAGE_CREDENTIAL",
            Privilege::CreateExternalLocation => "CREATE_EXTERNAL_LOCATION",
            Privilege::ManageCompute => "MANAGE_COMPUTE",
            Privilege::Modify => "MODIFY",
            Privilege::Manage => "MANAGE",
        }
    }

    /// Resolve a Rust variant identifier (`CreateSchema`) as written in
    /// source code.
    pub fn from_variant_ident(ident: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|privilege| format!("{privilege:?}") == ident)
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Privilege {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|privilege| privilege.as_str() == s)
            .ok_or_else(|| format!("unknown privilege: {s}"))
    }
}

/// Whether `privilege` means anything on a securable of `kind`.
///
/// The check routine rejects nonsensical pairs (e.g. `CREATE_SCHEMA` on a
/// table) instead of answering them.
pub fn is_valid_privilege_for_kind(kind: SecurableKind, privilege: Privilege) -> bool {
    use Privilege::*;
    use SecurableKind::*;

    match privilege {
        Modify | Manage => true,
        CreateSchema | CreateVolume | CreateStorageCredential | CreateExternalLocation => {
            kind == Catalog
        }
        CreateTable | CreateView => kind == Schema,
        ManageCompute => matches!(kind, Catalog | ComputeEndpoint),
    }
}
