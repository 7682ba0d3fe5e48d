//! Binds operation ids to the service methods that implement them.

use crate::registry::RegistryError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;

const BUILTIN_MANIFEST: &str = include_str!("../contracts/handlers.toml");

/// Where an operation is implemented.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerBinding {
    /// API operation id
    pub operation_id: String,
    /// Source file, relative to the workspace root
    pub file: PathBuf,
    /// Implementing type (`CatalogService`)
    pub receiver: String,
    /// Method name (`create_schema`)
    pub method: String,
}

impl HandlerBinding {
    /// `Type::method`
    pub fn qualified_method(&self) -> String {
        format!("{}::{}", self.receiver, self.method)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    handler: Vec<HandlerBinding>,
}

/// All handler bindings, keyed by operation id.
#[derive(Debug, Clone, Default)]
pub struct HandlerManifest {
    bindings: IndexMap<String, HandlerBinding>,
}

impl HandlerManifest {
    /// The manifest shipped with this crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_toml_str(BUILTIN_MANIFEST)
    }

    /// Parse a manifest document.
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let file: ManifestFile = toml::from_str(content)?;
        let mut bindings = IndexMap::with_capacity(file.handler.len());
        for binding in file.handler {
            if bindings.contains_key(&binding.operation_id) {
                return Err(RegistryError::Duplicate {
                    operation_id: binding.operation_id,
                });
            }
            bindings.insert(binding.operation_id.clone(), binding);
        }
        Ok(Self { bindings })
    }

    /// Binding for `operation_id`.
    pub fn get(&self, operation_id: &str) -> Option<&HandlerBinding> {
        self.bindings.get(operation_id)
    }

    /// Bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerBinding> {
        self.bindings.values()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::ContractRegistry;

    #[test]
    fn every_contract_has_exactly_one_handler() {
        let registry = ContractRegistry::builtin().unwrap();
        let manifest = HandlerManifest::builtin().unwrap();
        assert_eq!(registry.len(), manifest.len());
        for entry in registry.iter() {
            assert!(
                manifest.get(&entry.operation_id).is_some(),
                "no handler for {}",
                entry.operation_id
            );
        }
    }

    #[test]
    fn grant_administration_binds_to_grant_and_revoke() {
        let manifest = HandlerManifest::builtin().unwrap();
        assert_eq!(
            manifest.get("createGrant").unwrap().qualified_method(),
            "GrantService::grant"
        );
        assert_eq!(
            manifest.get("deleteGrant").unwrap().qualified_method(),
            "GrantService::revoke"
        );
    }
}
