//! In-memory catalog metadata.
//!
//! One lock guards the whole tree, so a mutation is applied entirely or not
//! at all and containment checks cannot race with inserts. Lookups return
//! [`CatalogError::NotFound`] keyed by the qualified name that was asked for.

use crate::error::{CatalogError, CatalogResult};
use crate::model::*;
use gatekeep_core::SecurableKind;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tree {
    catalogs: BTreeMap<String, CatalogInfo>,
    schemas: BTreeMap<String, SchemaInfo>,
    tables: BTreeMap<String, TableInfo>,
    views: BTreeMap<String, ViewInfo>,
    volumes: BTreeMap<String, VolumeInfo>,
    credentials: BTreeMap<String, StorageCredentialInfo>,
    locations: BTreeMap<String, ExternalLocationInfo>,
    endpoints: BTreeMap<String, ComputeEndpointInfo>,
    assignments: BTreeMap<String, ComputeAssignment>,
}

impl Tree {
    fn has_children(&self, catalog: &str) -> bool {
        let prefix = format!("{catalog}.");
        self.schemas.keys().any(|k| k.starts_with(&prefix))
            || self.volumes.keys().any(|k| k.starts_with(&prefix))
            || self.credentials.keys().any(|k| k.starts_with(&prefix))
            || self.locations.keys().any(|k| k.starts_with(&prefix))
            || self.endpoints.values().any(|e| e.catalog_name == catalog)
    }

    fn require_catalog(&self, catalog: &str) -> CatalogResult<()> {
        if self.catalogs.contains_key(catalog) {
            Ok(())
        } else {
            Err(CatalogError::not_found(SecurableKind::Catalog, catalog))
        }
    }
}

/// Qualified name from its segments.
pub fn qualified(parts: &[&str]) -> String {
    parts.join(".")
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn lookup<T: Clone>(
    map: &BTreeMap<String, T>,
    kind: SecurableKind,
    key: &str,
) -> CatalogResult<T> {
    map.get(key)
        .cloned()
        .ok_or_else(|| CatalogError::not_found(kind, key))
}

fn modify<T: Clone>(
    map: &mut BTreeMap<String, T>,
    kind: SecurableKind,
    key: &str,
    apply: impl FnOnce(&mut T) -> CatalogResult<()>,
) -> CatalogResult<T> {
    let entry = map
        .get_mut(key)
        .ok_or_else(|| CatalogError::not_found(kind, key))?;
    let mut updated = entry.clone();
    apply(&mut updated)?;
    *entry = updated.clone();
    Ok(updated)
}

fn vacant<T>(map: &BTreeMap<String, T>, kind: SecurableKind, key: &str) -> CatalogResult<()> {
    if map.contains_key(key) {
        Err(CatalogError::already_exists(kind, key))
    } else {
        Ok(())
    }
}

fn apply_comment(comment: &mut Option<String>, owner: &mut String, update: &UpdateComment) {
    if let Some(c) = &update.comment {
        *comment = Some(c.clone());
    }
    if let Some(o) = &update.owner {
        *owner = o.clone();
    }
}

/// Catalog metadata store.
#[derive(Debug, Default)]
pub struct MetadataStore {
    tree: RwLock<Tree>,
}

impl MetadataStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // Lookups

    /// Catalog by name.
    pub fn get_catalog(&self, name: &str) -> CatalogResult<CatalogInfo> {
        lookup(&self.tree.read().catalogs, SecurableKind::Catalog, name)
    }

    /// Schema by `catalog.schema`.
    pub fn get_schema(&self, catalog: &str, schema: &str) -> CatalogResult<SchemaInfo> {
        lookup(
            &self.tree.read().schemas,
            SecurableKind::Schema,
            &qualified(&[catalog, schema]),
        )
    }

    /// Table by `catalog.schema.table`.
    pub fn get_table(&self, catalog: &str, schema: &str, table: &str) -> CatalogResult<TableInfo> {
        lookup(
            &self.tree.read().tables,
            SecurableKind::Table,
            &qualified(&[catalog, schema, table]),
        )
    }

    /// View by `catalog.schema.view`.
    pub fn get_view(&self, catalog: &str, schema: &str, view: &str) -> CatalogResult<ViewInfo> {
        lookup(
            &self.tree.read().views,
            SecurableKind::View,
            &qualified(&[catalog, schema, view]),
        )
    }

    /// Volume by `catalog.volume`.
    pub fn get_volume(&self, catalog: &str, name: &str) -> CatalogResult<VolumeInfo> {
        lookup(
            &self.tree.read().volumes,
            SecurableKind::Volume,
            &qualified(&[catalog, name]),
        )
    }

    /// Storage credential by `catalog.credential`.
    pub fn get_storage_credential(
        &self,
        catalog: &str,
        name: &str,
    ) -> CatalogResult<StorageCredentialInfo> {
        lookup(
            &self.tree.read().credentials,
            SecurableKind::StorageCredential,
            &qualified(&[catalog, name]),
        )
    }

    /// External location by `catalog.location`.
    pub fn get_external_location(
        &self,
        catalog: &str,
        name: &str,
    ) -> CatalogResult<ExternalLocationInfo> {
        lookup(
            &self.tree.read().locations,
            SecurableKind::ExternalLocation,
            &qualified(&[catalog, name]),
        )
    }

    /// Compute endpoint by name. Endpoint names are unique across catalogs.
    pub fn get_compute_endpoint(&self, name: &str) -> CatalogResult<ComputeEndpointInfo> {
        lookup(
            &self.tree.read().endpoints,
            SecurableKind::ComputeEndpoint,
            name,
        )
    }

    /// Assignments on an endpoint.
    pub fn compute_assignments(&self, endpoint_id: &str) -> Vec<ComputeAssignment> {
        self.tree
            .read()
            .assignments
            .values()
            .filter(|a| a.endpoint_id == endpoint_id)
            .cloned()
            .collect()
    }

    /// Catalog names, sorted.
    pub fn catalog_names(&self) -> Vec<String> {
        self.tree.read().catalogs.keys().cloned().collect()
    }

    // Catalogs

    /// Insert a catalog.
    pub fn insert_catalog(&self, catalog: CatalogInfo) -> CatalogResult<CatalogInfo> {
        let mut tree = self.tree.write();
        vacant(&tree.catalogs, SecurableKind::Catalog, &catalog.name)?;
        tree.catalogs.insert(catalog.name.clone(), catalog.clone());
        Ok(catalog)
    }

    /// Insert unless present. Returns whether it was inserted.
    pub fn ensure_catalog(&self, name: &str) -> bool {
        let mut tree = self.tree.write();
        if tree.catalogs.contains_key(name) {
            return false;
        }
        tree.catalogs.insert(
            name.to_string(),
            CatalogInfo {
                name: name.to_string(),
                owner: None,
                comment: None,
            },
        );
        true
    }

    /// Apply an update to a catalog.
    pub fn update_catalog(&self, name: &str, update: &UpdateComment) -> CatalogResult<CatalogInfo> {
        modify(
            &mut self.tree.write().catalogs,
            SecurableKind::Catalog,
            name,
            |c| {
                if let Some(comment) = &update.comment {
                    c.comment = Some(comment.clone());
                }
                if let Some(owner) = &update.owner {
                    c.owner = Some(owner.clone());
                }
                Ok(())
            },
        )
    }

    /// Remove an empty catalog.
    pub fn remove_catalog(&self, name: &str) -> CatalogResult<CatalogInfo> {
        let mut tree = self.tree.write();
        tree.require_catalog(name)?;
        if tree.has_children(name) {
            return Err(CatalogError::invalid(format!("catalog {name} is not empty")));
        }
        tree.catalogs
            .remove(name)
            .ok_or_else(|| CatalogError::not_found(SecurableKind::Catalog, name))
    }

    // Schemas

    /// Create a schema in an existing catalog.
    pub fn insert_schema(&self, req: &CreateSchema, owner: &str) -> CatalogResult<SchemaInfo> {
        let mut tree = self.tree.write();
        tree.require_catalog(&req.catalog_name)?;
        let key = qualified(&[&req.catalog_name, &req.name]);
        vacant(&tree.schemas, SecurableKind::Schema, &key)?;
        let schema = SchemaInfo {
            id: new_id(),
            catalog_name: req.catalog_name.clone(),
            name: req.name.clone(),
            owner: owner.to_string(),
            comment: req.comment.clone(),
        };
        tree.schemas.insert(key, schema.clone());
        Ok(schema)
    }

    /// Apply an update to a schema.
    pub fn update_schema(
        &self,
        catalog: &str,
        schema: &str,
        update: &UpdateComment,
    ) -> CatalogResult<SchemaInfo> {
        modify(
            &mut self.tree.write().schemas,
            SecurableKind::Schema,
            &qualified(&[catalog, schema]),
            |s| {
                apply_comment(&mut s.comment, &mut s.owner, update);
                Ok(())
            },
        )
    }

    /// Remove an empty schema.
    pub fn remove_schema(&self, catalog: &str, schema: &str) -> CatalogResult<SchemaInfo> {
        let mut tree = self.tree.write();
        let key = qualified(&[catalog, schema]);
        let prefix = format!("{key}.");
        if tree.tables.keys().any(|k| k.starts_with(&prefix))
            || tree.views.keys().any(|k| k.starts_with(&prefix))
        {
            return Err(CatalogError::invalid(format!("schema {key} is not empty")));
        }
        tree.schemas
            .remove(&key)
            .ok_or_else(|| CatalogError::not_found(SecurableKind::Schema, key))
    }

    // Tables

    /// Create a table in an existing schema.
    pub fn insert_table(&self, req: &CreateTable, owner: &str) -> CatalogResult<TableInfo> {
        let mut tree = self.tree.write();
        let schema_key = qualified(&[&req.catalog_name, &req.schema_name]);
        lookup(&tree.schemas, SecurableKind::Schema, &schema_key)?;
        let key = qualified(&[&req.catalog_name, &req.schema_name, &req.name]);
        vacant(&tree.tables, SecurableKind::Table, &key)?;
        vacant(&tree.views, SecurableKind::View, &key)?;

        let mut columns = indexmap::IndexMap::new();
        for (name, column) in &req.columns {
            if columns.insert(name.clone(), column.clone()).is_some() {
                return Err(CatalogError::invalid(format!("duplicate column {name}")));
            }
        }
        let table = TableInfo {
            id: new_id(),
            catalog_name: req.catalog_name.clone(),
            schema_name: req.schema_name.clone(),
            name: req.name.clone(),
            owner: owner.to_string(),
            columns,
            comment: req.comment.clone(),
        };
        tree.tables.insert(key, table.clone());
        Ok(table)
    }

    /// Apply an update to a table.
    pub fn update_table(&self, table: &TableInfo, update: &UpdateComment) -> CatalogResult<TableInfo> {
        modify(
            &mut self.tree.write().tables,
            SecurableKind::Table,
            &table.full_name(),
            |t| {
                apply_comment(&mut t.comment, &mut t.owner, update);
                Ok(())
            },
        )
    }

    /// Change one column of a table.
    pub fn update_column(
        &self,
        table: &TableInfo,
        column: &str,
        update: &UpdateColumn,
    ) -> CatalogResult<TableInfo> {
        modify(
            &mut self.tree.write().tables,
            SecurableKind::Table,
            &table.full_name(),
            |t| {
                let col = t.columns.get_mut(column).ok_or_else(|| {
                    CatalogError::invalid(format!("no column {column} in {}", table.full_name()))
                })?;
                if let Some(data_type) = &update.data_type {
                    col.data_type = data_type.clone();
                }
                if let Some(nullable) = update.nullable {
                    col.nullable = nullable;
                }
                if let Some(comment) = &update.comment {
                    col.comment = Some(comment.clone());
                }
                Ok(())
            },
        )
    }

    /// Remove a table.
    pub fn remove_table(&self, table: &TableInfo) -> CatalogResult<TableInfo> {
        let key = table.full_name();
        self.tree
            .write()
            .tables
            .remove(&key)
            .ok_or_else(|| CatalogError::not_found(SecurableKind::Table, key))
    }

    // Views

    /// Create a view in an existing schema.
    pub fn insert_view(&self, req: &CreateView, owner: &str) -> CatalogResult<ViewInfo> {
        let mut tree = self.tree.write();
        let schema_key = qualified(&[&req.catalog_name, &req.schema_name]);
        lookup(&tree.schemas, SecurableKind::Schema, &schema_key)?;
        let key = qualified(&[&req.catalog_name, &req.schema_name, &req.name]);
        vacant(&tree.views, SecurableKind::View, &key)?;
        vacant(&tree.tables, SecurableKind::Table, &key)?;
        if req.definition.trim().is_empty() {
            return Err(CatalogError::invalid("view definition is empty"));
        }
        let view = ViewInfo {
            id: new_id(),
            catalog_name: req.catalog_name.clone(),
            schema_name: req.schema_name.clone(),
            name: req.name.clone(),
            owner: owner.to_string(),
            definition: req.definition.clone(),
            comment: None,
        };
        tree.views.insert(key, view.clone());
        Ok(view)
    }

    /// Apply an update to a view.
    pub fn update_view(&self, view: &ViewInfo, update: &UpdateComment) -> CatalogResult<ViewInfo> {
        modify(
            &mut self.tree.write().views,
            SecurableKind::View,
            &view.full_name(),
            |v| {
                apply_comment(&mut v.comment, &mut v.owner, update);
                Ok(())
            },
        )
    }

    /// Remove a view.
    pub fn remove_view(&self, view: &ViewInfo) -> CatalogResult<ViewInfo> {
        let key = view.full_name();
        self.tree
            .write()
            .views
            .remove(&key)
            .ok_or_else(|| CatalogError::not_found(SecurableKind::View, key))
    }

    // Catalog-scoped storage objects

    /// Create a volume.
    pub fn insert_volume(&self, req: &CreateVolume, owner: &str) -> CatalogResult<VolumeInfo> {
        let mut tree = self.tree.write();
        tree.require_catalog(&req.catalog_name)?;
        let key = qualified(&[&req.catalog_name, &req.name]);
        vacant(&tree.volumes, SecurableKind::Volume, &key)?;
        let volume = VolumeInfo {
            id: new_id(),
            catalog_name: req.catalog_name.clone(),
            name: req.name.clone(),
            owner: owner.to_string(),
            storage_location: req.storage_location.clone(),
            comment: req.comment.clone(),
        };
        tree.volumes.insert(key, volume.clone());
        Ok(volume)
    }

    /// Apply an update to a volume.
    pub fn update_volume(&self, volume: &VolumeInfo, update: &UpdateComment) -> CatalogResult<VolumeInfo> {
        modify(
            &mut self.tree.write().volumes,
            SecurableKind::Volume,
            &qualified(&[&volume.catalog_name, &volume.name]),
            |v| {
                apply_comment(&mut v.comment, &mut v.owner, update);
                Ok(())
            },
        )
    }

    /// Remove a volume.
    pub fn remove_volume(&self, volume: &VolumeInfo) -> CatalogResult<VolumeInfo> {
        let key = qualified(&[&volume.catalog_name, &volume.name]);
        self.tree
            .write()
            .volumes
            .remove(&key)
            .ok_or_else(|| CatalogError::not_found(SecurableKind::Volume, key))
    }

    /// Register a storage credential.
    pub fn insert_storage_credential(
        &self,
        req: &CreateStorageCredential,
        owner: &str,
    ) -> CatalogResult<StorageCredentialInfo> {
        let mut tree = self.tree.write();
        tree.require_catalog(&req.catalog_name)?;
        let key = qualified(&[&req.catalog_name, &req.name]);
        vacant(&tree.credentials, SecurableKind::StorageCredential, &key)?;
        let credential = StorageCredentialInfo {
            id: new_id(),
            catalog_name: req.catalog_name.clone(),
            name: req.name.clone(),
            owner: owner.to_string(),
            provider: req.provider.clone(),
            comment: req.comment.clone(),
        };
        tree.credentials.insert(key, credential.clone());
        Ok(credential)
    }

    /// Apply an update to a storage credential.
    pub fn update_storage_credential(
        &self,
        credential: &StorageCredentialInfo,
        update: &UpdateComment,
    ) -> CatalogResult<StorageCredentialInfo> {
        modify(
            &mut self.tree.write().credentials,
            SecurableKind::StorageCredential,
            &qualified(&[&credential.catalog_name, &credential.name]),
            |c| {
                apply_comment(&mut c.comment, &mut c.owner, update);
                Ok(())
            },
        )
    }

    /// Remove a storage credential no external location still uses.
    pub fn remove_storage_credential(
        &self,
        credential: &StorageCredentialInfo,
    ) -> CatalogResult<StorageCredentialInfo> {
        let mut tree = self.tree.write();
        let key = qualified(&[&credential.catalog_name, &credential.name]);
        if tree.locations.values().any(|l| {
            l.catalog_name == credential.catalog_name && l.credential_name == credential.name
        }) {
            return Err(CatalogError::invalid(format!(
                "storage credential {key} is used by an external location"
            )));
        }
        tree.credentials
            .remove(&key)
            .ok_or_else(|| CatalogError::not_found(SecurableKind::StorageCredential, key))
    }

    /// Register an external location over an existing credential.
    pub fn insert_external_location(
        &self,
        req: &CreateExternalLocation,
        owner: &str,
    ) -> CatalogResult<ExternalLocationInfo> {
        let mut tree = self.tree.write();
        tree.require_catalog(&req.catalog_name)?;
        let credential_key = qualified(&[&req.catalog_name, &req.credential_name]);
        lookup(
            &tree.credentials,
            SecurableKind::StorageCredential,
            &credential_key,
        )?;
        let key = qualified(&[&req.catalog_name, &req.name]);
        vacant(&tree.locations, SecurableKind::ExternalLocation, &key)?;
        let location = ExternalLocationInfo {
            id: new_id(),
            catalog_name: req.catalog_name.clone(),
            name: req.name.clone(),
            owner: owner.to_string(),
            url: req.url.clone(),
            credential_name: req.credential_name.clone(),
            comment: req.comment.clone(),
        };
        tree.locations.insert(key, location.clone());
        Ok(location)
    }

    /// Apply an update to an external location.
    pub fn update_external_location(
        &self,
        location: &ExternalLocationInfo,
        update: &UpdateComment,
    ) -> CatalogResult<ExternalLocationInfo> {
        modify(
            &mut self.tree.write().locations,
            SecurableKind::ExternalLocation,
            &qualified(&[&location.catalog_name, &location.name]),
            |l| {
                apply_comment(&mut l.comment, &mut l.owner, update);
                Ok(())
            },
        )
    }

    /// Remove an external location.
    pub fn remove_external_location(
        &self,
        location: &ExternalLocationInfo,
    ) -> CatalogResult<ExternalLocationInfo> {
        let key = qualified(&[&location.catalog_name, &location.name]);
        self.tree
            .write()
            .locations
            .remove(&key)
            .ok_or_else(|| CatalogError::not_found(SecurableKind::ExternalLocation, key))
    }

    // Compute

    /// Create a compute endpoint in `catalog`.
    pub fn insert_compute_endpoint(
        &self,
        catalog: &str,
        req: &CreateComputeEndpoint,
        owner: &str,
    ) -> CatalogResult<ComputeEndpointInfo> {
        let mut tree = self.tree.write();
        tree.require_catalog(catalog)?;
        vacant(&tree.endpoints, SecurableKind::ComputeEndpoint, &req.name)?;
        let endpoint = ComputeEndpointInfo {
            id: new_id(),
            catalog_name: catalog.to_string(),
            name: req.name.clone(),
            owner: owner.to_string(),
            url: req.url.clone(),
            size: req.size.clone(),
        };
        tree.endpoints.insert(req.name.clone(), endpoint.clone());
        Ok(endpoint)
    }

    /// Apply an update to a compute endpoint.
    pub fn update_compute_endpoint(
        &self,
        endpoint: &ComputeEndpointInfo,
        update: &UpdateComputeEndpoint,
    ) -> CatalogResult<ComputeEndpointInfo> {
        modify(
            &mut self.tree.write().endpoints,
            SecurableKind::ComputeEndpoint,
            &endpoint.name,
            |e| {
                if let Some(url) = &update.url {
                    e.url = url.clone();
                }
                if let Some(size) = &update.size {
                    e.size = size.clone();
                }
                Ok(())
            },
        )
    }

    /// Remove a compute endpoint together with its assignments.
    pub fn remove_compute_endpoint(
        &self,
        endpoint: &ComputeEndpointInfo,
    ) -> CatalogResult<ComputeEndpointInfo> {
        let mut tree = self.tree.write();
        let removed = tree.endpoints.remove(&endpoint.name).ok_or_else(|| {
            CatalogError::not_found(SecurableKind::ComputeEndpoint, endpoint.name.clone())
        })?;
        tree.assignments.retain(|_, a| a.endpoint_id != removed.id);
        Ok(removed)
    }

    /// Assign a principal to an endpoint. Assigning twice returns the existing
    /// assignment.
    pub fn insert_compute_assignment(
        &self,
        endpoint: &ComputeEndpointInfo,
        principal: &str,
    ) -> CatalogResult<ComputeAssignment> {
        let mut tree = self.tree.write();
        if !tree.endpoints.values().any(|e| e.id == endpoint.id) {
            return Err(CatalogError::not_found(
                SecurableKind::ComputeEndpoint,
                endpoint.name.clone(),
            ));
        }
        if let Some(existing) = tree
            .assignments
            .values()
            .find(|a| a.endpoint_id == endpoint.id && a.principal == principal)
        {
            return Ok(existing.clone());
        }
        let assignment = ComputeAssignment {
            id: new_id(),
            endpoint_id: endpoint.id.clone(),
            principal: principal.to_string(),
        };
        tree.assignments
            .insert(assignment.id.clone(), assignment.clone());
        Ok(assignment)
    }

    /// Remove an assignment by id.
    pub fn remove_compute_assignment(&self, id: &str) -> CatalogResult<ComputeAssignment> {
        self.tree
            .write()
            .assignments
            .remove(id)
            .ok_or_else(|| CatalogError::invalid(format!("no compute assignment {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MetadataStore {
        let store = MetadataStore::new();
        store.ensure_catalog("sales");
        store
            .insert_schema(
                &CreateSchema {
                    catalog_name: "sales".into(),
                    name: "orders".into(),
                    comment: None,
                },
                "alice",
            )
            .unwrap();
        store
    }

    #[test]
    fn lookups_report_qualified_name() {
        let store = seeded();
        let err = store.get_table("sales", "orders", "ghost").unwrap_err();
        assert_eq!(err.to_string(), "table not found: sales.orders.ghost");
    }

    #[test]
    fn schema_requires_catalog() {
        let store = MetadataStore::new();
        let err = store
            .insert_schema(
                &CreateSchema {
                    catalog_name: "nowhere".into(),
                    name: "s".into(),
                    comment: None,
                },
                "alice",
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn non_empty_containers_are_kept() {
        let store = seeded();
        assert!(matches!(
            store.remove_catalog("sales"),
            Err(CatalogError::Invalid { .. })
        ));
        store.remove_schema("sales", "orders").unwrap();
        store.remove_catalog("sales").unwrap();
        assert!(store.catalog_names().is_empty());
    }

    #[test]
    fn columns_keep_declaration_order() {
        let store = seeded();
        let column = |t: &str| ColumnInfo {
            data_type: t.into(),
            nullable: true,
            comment: None,
        };
        let table = store
            .insert_table(
                &CreateTable {
                    catalog_name: "sales".into(),
                    schema_name: "orders".into(),
                    name: "events".into(),
                    columns: vec![
                        ("z".into(), column("int")),
                        ("a".into(), column("string")),
                    ],
                    comment: None,
                },
                "alice",
            )
            .unwrap();
        let names: Vec<_> = table.columns.keys().cloned().collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn failed_update_leaves_entry_untouched() {
        let store = seeded();
        let table = store
            .insert_table(
                &CreateTable {
                    catalog_name: "sales".into(),
                    schema_name: "orders".into(),
                    name: "events".into(),
                    columns: vec![],
                    comment: None,
                },
                "alice",
            )
            .unwrap();
        let err = store
            .update_column(&table, "missing", &UpdateColumn::default())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid { .. }));
        assert_eq!(store.get_table("sales", "orders", "events").unwrap(), table);
    }

    #[test]
    fn deleting_endpoint_drops_assignments() {
        let store = MetadataStore::new();
        store.ensure_catalog("main");
        let endpoint = store
            .insert_compute_endpoint(
                "main",
                &CreateComputeEndpoint {
                    catalog_name: None,
                    name: "wh".into(),
                    url: "http://wh".into(),
                    size: "small".into(),
                },
                "bob",
            )
            .unwrap();
        let first = store.insert_compute_assignment(&endpoint, "alice").unwrap();
        let again = store.insert_compute_assignment(&endpoint, "alice").unwrap();
        assert_eq!(first, again);

        store.remove_compute_endpoint(&endpoint).unwrap();
        assert!(store.compute_assignments(&endpoint.id).is_empty());
    }
}
