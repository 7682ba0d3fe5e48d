//! Operation ids, as they appear in audit records and the contract registry.

#![allow(missing_docs)]

pub const CREATE_CATALOG: &str = "createCatalog";
pub const UPDATE_CATALOG: &str = "updateCatalog";
pub const DELETE_CATALOG: &str = "deleteCatalog";
pub const ATTACH_CATALOGS: &str = "attachCatalogs";

pub const CREATE_SCHEMA: &str = "createSchema";
pub const UPDATE_SCHEMA: &str = "updateSchema";
pub const DELETE_SCHEMA: &str = "deleteSchema";

pub const CREATE_TABLE: &str = "createTable";
pub const UPDATE_TABLE: &str = "updateTable";
pub const DELETE_TABLE: &str = "deleteTable";
pub const UPDATE_COLUMN: &str = "updateColumn";

pub const CREATE_VIEW: &str = "createView";
pub const UPDATE_VIEW: &str = "updateView";
pub const DELETE_VIEW: &str = "deleteView";

pub const CREATE_VOLUME: &str = "createVolume";
pub const UPDATE_VOLUME: &str = "updateVolume";
pub const DELETE_VOLUME: &str = "deleteVolume";

pub const CREATE_STORAGE_CREDENTIAL: &str = "createStorageCredential";
pub const UPDATE_STORAGE_CREDENTIAL: &str = "updateStorageCredential";
pub const DELETE_STORAGE_CREDENTIAL: &str = "deleteStorageCredential";

pub const CREATE_EXTERNAL_LOCATION: &str = "createExternalLocation";
pub const UPDATE_EXTERNAL_LOCATION: &str = "updateExternalLocation";
pub const DELETE_EXTERNAL_LOCATION: &str = "deleteExternalLocation";

pub const CREATE_COMPUTE_ENDPOINT: &str = "createComputeEndpoint";
pub const UPDATE_COMPUTE_ENDPOINT: &str = "updateComputeEndpoint";
pub const DELETE_COMPUTE_ENDPOINT: &str = "deleteComputeEndpoint";
pub const CREATE_COMPUTE_ASSIGNMENT: &str = "createComputeAssignment";
pub const DELETE_COMPUTE_ASSIGNMENT: &str = "deleteComputeAssignment";

pub const CREATE_GRANT: &str = "createGrant";
pub const DELETE_GRANT: &str = "deleteGrant";
pub const LIST_GRANTS: &str = "listGrants";
