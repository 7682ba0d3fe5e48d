//! The authorization contract registry.
//!
//! One declared enforcement per API operation, kept as data in
//! `contracts/authz.toml`. The registry is never consulted while serving a
//! request; service methods enforce directly. It exists to be diffed against
//! the enforcement calls in the source.

use gatekeep_core::{is_valid_privilege_for_kind, AuthzMode, Privilege, SecurableIdSource, SecurableKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

const BUILTIN_REGISTRY: &str = include_str!("../contracts/authz.toml");

/// Registry loading errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Document is not valid TOML, or an entry failed its own checks
    #[error("Invalid contract registry: {0}")]
    Parse(#[from] toml::de::Error),
    /// The same operation is declared twice
    #[error("Operation {operation_id} is declared more than once")]
    Duplicate {
        /// Repeated operation id
        operation_id: String,
    },
}

/// Why a single entry was rejected. Surfaces through [`RegistryError::Parse`].
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    /// A privilege-checked mode is missing one of its fields
    #[error("{operation_id}: mode {mode} requires `{field}`")]
    Incomplete {
        /// Offending entry
        operation_id: String,
        /// Declared mode
        mode: AuthzMode,
        /// Missing field
        field: &'static str,
    },
    /// `admin_only` entries carry no check fields
    #[error("{operation_id}: admin_only takes no securable or privilege")]
    AdminOnlyWithCheck {
        /// Offending entry
        operation_id: String,
    },
    /// The privilege can never be granted on the declared kind
    #[error("{operation_id}: {privilege} is not valid on a {securable_type}")]
    InvalidPrivilege {
        /// Offending entry
        operation_id: String,
        /// Declared kind
        securable_type: SecurableKind,
        /// Declared privilege
        privilege: Privilege,
    },
}

/// The `(kind, privilege, source)` triple a checked mode declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContractCheck {
    /// Kind of the checked securable
    pub securable_type: SecurableKind,
    /// Privilege required on it
    pub privilege: Privilege,
    /// Where the checked id comes from
    pub securable_id_source: SecurableIdSource,
}

/// Declared enforcement. Closed: `admin_only` has no check to declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthzContract {
    /// Privilege check
    Privilege(ContractCheck),
    /// Owner bypass, then privilege check
    OwnerOrPrivilege(ContractCheck),
    /// Admins only
    AdminOnly,
}

impl AuthzContract {
    /// Mode this contract declares.
    pub fn mode(&self) -> AuthzMode {
        match self {
            AuthzContract::Privilege(_) => AuthzMode::Privilege,
            AuthzContract::OwnerOrPrivilege(_) => AuthzMode::OwnerOrPrivilege,
            AuthzContract::AdminOnly => AuthzMode::AdminOnly,
        }
    }

    /// The declared check, for the modes that have one.
    pub fn check(&self) -> Option<&ContractCheck> {
        match self {
            AuthzContract::Privilege(check) | AuthzContract::OwnerOrPrivilege(check) => Some(check),
            AuthzContract::AdminOnly => None,
        }
    }
}

impl fmt::Display for AuthzContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.check() {
            Some(check) => write!(
                f,
                "{} {} on {} ({})",
                self.mode(),
                check.privilege,
                check.securable_type,
                check.securable_id_source
            ),
            None => write!(f, "{}", self.mode()),
        }
    }
}

/// One operation and its declared enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct ContractEntry {
    /// API operation id (`createSchema`)
    pub operation_id: String,
    /// Declared enforcement
    #[serde(flatten)]
    pub contract: AuthzContract,
}

/// Flat on-disk shape of an entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    operation_id: String,
    mode: AuthzMode,
    securable_type: Option<SecurableKind>,
    privilege: Option<Privilege>,
    securable_id_source: Option<SecurableIdSource>,
}

impl TryFrom<RawEntry> for ContractEntry {
    type Error = EntryError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let contract = match raw.mode {
            AuthzMode::AdminOnly => {
                if raw.securable_type.is_some()
                    || raw.privilege.is_some()
                    || raw.securable_id_source.is_some()
                {
                    return Err(EntryError::AdminOnlyWithCheck {
                        operation_id: raw.operation_id,
                    });
                }
                AuthzContract::AdminOnly
            }
            mode => {
                let check = raw.check(mode)?;
                if mode == AuthzMode::Privilege {
                    AuthzContract::Privilege(check)
                } else {
                    AuthzContract::OwnerOrPrivilege(check)
                }
            }
        };
        Ok(ContractEntry {
            operation_id: raw.operation_id,
            contract,
        })
    }
}

impl RawEntry {
    fn check(&self, mode: AuthzMode) -> Result<ContractCheck, EntryError> {
        let incomplete = |field| EntryError::Incomplete {
            operation_id: self.operation_id.clone(),
            mode,
            field,
        };
        let securable_type = self.securable_type.ok_or_else(|| incomplete("securable_type"))?;
        let privilege = self.privilege.ok_or_else(|| incomplete("privilege"))?;
        let securable_id_source = self
            .securable_id_source
            .ok_or_else(|| incomplete("securable_id_source"))?;
        if !is_valid_privilege_for_kind(securable_type, privilege) {
            return Err(EntryError::InvalidPrivilege {
                operation_id: self.operation_id.clone(),
                securable_type,
                privilege,
            });
        }
        Ok(ContractCheck {
            securable_type,
            privilege,
            securable_id_source,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(default)]
    operation: Vec<ContractEntry>,
}

/// Every declared contract, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    entries: IndexMap<String, ContractEntry>,
}

impl ContractRegistry {
    /// The registry shipped with this crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    /// Parse a registry document.
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(content)?;
        let mut entries = IndexMap::with_capacity(file.operation.len());
        for entry in file.operation {
            if entries.contains_key(&entry.operation_id) {
                return Err(RegistryError::Duplicate {
                    operation_id: entry.operation_id,
                });
            }
            entries.insert(entry.operation_id.clone(), entry);
        }
        Ok(Self { entries })
    }

    /// Contract for `operation_id`.
    pub fn get(&self, operation_id: &str) -> Option<&ContractEntry> {
        self.entries.get(operation_id)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ContractEntry> {
        self.entries.values()
    }

    /// Number of declared operations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn builtin_registry_parses() {
        let registry = ContractRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 30);

        let create_table = registry.get("createTable").unwrap();
        assert_eq!(
            create_table.contract,
            AuthzContract::Privilege(ContractCheck {
                securable_type: SecurableKind::Schema,
                privilege: Privilege::CreateTable,
                securable_id_source: SecurableIdSource::RuntimeResolvedObjectId,
            })
        );
        assert_eq!(
            registry.get("createGrant").unwrap().contract,
            AuthzContract::AdminOnly
        );
        assert_eq!(
            registry.get("deleteCatalog").unwrap().contract.mode(),
            AuthzMode::OwnerOrPrivilege
        );
    }

    #[test]
    fn admin_only_with_a_privilege_is_rejected() {
        let err = ContractRegistry::from_toml_str(
            r#"
            [[operation]]
            operation_id = "createGrant"
            mode = "admin_only"
            privilege = "MANAGE"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("admin_only takes no securable"));
    }

    #[test]
    fn checked_mode_needs_every_field() {
        let err = ContractRegistry::from_toml_str(
            r#"
            [[operation]]
            operation_id = "updateTable"
            mode = "privilege"
            securable_type = "table"
            privilege = "MODIFY"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("securable_id_source"));
    }

    #[test]
    fn privilege_must_be_grantable_on_the_kind() {
        let err = ContractRegistry::from_toml_str(
            r#"
            [[operation]]
            operation_id = "createTable"
            mode = "privilege"
            securable_type = "catalog"
            privilege = "CREATE_TABLE"
            securable_id_source = "catalog_name_param"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("CREATE_TABLE is not valid on a catalog"));
    }

    #[test]
    fn duplicates_are_rejected() {
        let entry = r#"
            [[operation]]
            operation_id = "createGrant"
            mode = "admin_only"
        "#;
        let err = ContractRegistry::from_toml_str(&format!("{entry}{entry}")).unwrap_err();
        assert_matches!(err, RegistryError::Duplicate { operation_id } if operation_id == "createGrant");
    }

    #[test]
    fn display_reads_like_the_table() {
        let registry = ContractRegistry::builtin().unwrap();
        assert_eq!(
            registry.get("createVolume").unwrap().contract.to_string(),
            "privilege CREATE_VOLUME on catalog (catalog_sentinel)"
        );
    }
}
