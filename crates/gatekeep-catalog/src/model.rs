//! Catalog entities and request payloads.
//!
//! Catalogs are keyed by name and their grant id is the name. Every other
//! entity gets a durable id at creation; grants on it are issued against that
//! id, never against its name.

#![allow(missing_docs)]

use gatekeep_core::{Privilege, SecurableKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Top-level namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

/// Schema inside a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub id: String,
    pub catalog_name: String,
    pub name: String,
    pub owner: String,
    pub comment: Option<String>,
}

impl SchemaInfo {
    /// `catalog.schema`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.catalog_name, self.name)
    }
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub data_type: String,
    pub nullable: bool,
    pub comment: Option<String>,
}

/// Table inside a schema. Columns keep declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: String,
    pub catalog_name: String,
    pub schema_name: String,
    pub name: String,
    pub owner: String,
    pub columns: IndexMap<String, ColumnInfo>,
    pub comment: Option<String>,
}

impl TableInfo {
    /// `catalog.schema.table`
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog_name, self.schema_name, self.name)
    }
}

/// View inside a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewInfo {
    pub id: String,
    pub catalog_name: String,
    pub schema_name: String,
    pub name: String,
    pub owner: String,
    pub definition: String,
    pub comment: Option<String>,
}

impl ViewInfo {
    /// `catalog.schema.view`
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog_name, self.schema_name, self.name)
    }
}

/// Managed or external file storage inside a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub id: String,
    pub catalog_name: String,
    pub name: String,
    pub owner: String,
    pub storage_location: Option<String>,
    pub comment: Option<String>,
}

/// Cloud credential registered in a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCredentialInfo {
    pub id: String,
    pub catalog_name: String,
    pub name: String,
    pub owner: String,
    pub provider: String,
    pub comment: Option<String>,
}

/// URL prefix bound to a storage credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLocationInfo {
    pub id: String,
    pub catalog_name: String,
    pub name: String,
    pub owner: String,
    pub url: String,
    pub credential_name: String,
    pub comment: Option<String>,
}

/// Compute endpoint scoped to a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeEndpointInfo {
    pub id: String,
    pub catalog_name: String,
    pub name: String,
    pub owner: String,
    pub url: String,
    pub size: String,
}

/// Binding of a principal to a compute endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeAssignment {
    pub id: String,
    pub endpoint_id: String,
    pub principal: String,
}

/// `createCatalog` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCatalog {
    pub name: String,
    pub comment: Option<String>,
}

/// `createSchema` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSchema {
    pub catalog_name: String,
    pub name: String,
    pub comment: Option<String>,
}

/// `createTable` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTable {
    pub catalog_name: String,
    pub schema_name: String,
    pub name: String,
    pub columns: Vec<(String, ColumnInfo)>,
    pub comment: Option<String>,
}

/// `createView` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateView {
    pub catalog_name: String,
    pub schema_name: String,
    pub name: String,
    pub definition: String,
}

/// `createVolume` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateVolume {
    pub catalog_name: String,
    pub name: String,
    pub storage_location: Option<String>,
    pub comment: Option<String>,
}

/// `createStorageCredential` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateStorageCredential {
    pub catalog_name: String,
    pub name: String,
    pub provider: String,
    pub comment: Option<String>,
}

/// `createExternalLocation` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateExternalLocation {
    pub catalog_name: String,
    pub name: String,
    pub url: String,
    pub credential_name: String,
    pub comment: Option<String>,
}

/// `createComputeEndpoint` payload. Without a catalog the endpoint lands in
/// the configured default catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateComputeEndpoint {
    pub catalog_name: Option<String>,
    pub name: String,
    pub url: String,
    pub size: String,
}

/// Partial update shared by the simple `update*` operations. `None` leaves a
/// field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateComment {
    pub comment: Option<String>,
    pub owner: Option<String>,
}

/// `updateColumn` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateColumn {
    pub data_type: Option<String>,
    pub nullable: Option<bool>,
    pub comment: Option<String>,
}

/// `updateComputeEndpoint` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateComputeEndpoint {
    pub url: Option<String>,
    pub size: Option<String>,
}

/// `createGrant` / `deleteGrant` payload. The securable is named the way a
/// client names it; the service resolves it to a grant id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRequest {
    pub principal: String,
    pub securable_type: SecurableKind,
    pub full_name: String,
    pub privilege: Privilege,
}
