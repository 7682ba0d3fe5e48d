use super::{check_name, resolve, revoke_grants_on, split2, split3};
use crate::error::CatalogResult;
use crate::model::*;
use crate::ops;
use crate::store::{qualified, MetadataStore};
use gatekeep_audit::AuditLog;
use gatekeep_authorization::Authorizer;
use gatekeep_core::{Privilege, RequestContext, SecurableKind, SecurableRef};
use std::sync::Arc;
use tracing::info;

/// Catalogs, schemas, tables, columns and views.
#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Arc<MetadataStore>,
    authz: Authorizer,
    audit: Arc<AuditLog>,
}

impl CatalogService {
    /// Service over `store`, enforcing through `authz`.
    pub fn new(store: Arc<MetadataStore>, authz: Authorizer) -> Self {
        let audit = Arc::clone(authz.audit());
        Self {
            store,
            authz,
            audit,
        }
    }

    /// Register the configured catalogs at startup.
    ///
    /// Audited once as a system event instead of per call. Returns how many
    /// catalogs were new.
    pub async fn attach_all(&self, ctx: &RequestContext, names: &[String]) -> CatalogResult<usize> {
        let mut attached = Vec::new();
        for name in names {
            check_name(name)?;
            if self.store.ensure_catalog(name) {
                attached.push(name.as_str());
            }
        }
        info!(request_id = %ctx.request_id(), attached = attached.len(), "catalogs attached");
        self.audit
            .system_event(
                ops::ATTACH_CATALOGS,
                "catalog:*",
                Some(attached.join(",")),
            )
            .await?;
        Ok(attached.len())
    }

    /// `createCatalog`: admins only. The creator becomes the owner.
    pub async fn create_catalog(
        &self,
        ctx: &RequestContext,
        req: CreateCatalog,
    ) -> CatalogResult<CatalogInfo> {
        self.audit
            .mutation(ctx, ops::CREATE_CATALOG, SecurableRef::catalog_param(&req.name), async {
                self.authz
                    .require_admin(ctx, ops::CREATE_CATALOG, SecurableRef::catalog_param(&req.name))
                    .await?;
                check_name(&req.name)?;
                self.store.insert_catalog(CatalogInfo {
                    name: req.name.clone(),
                    owner: Some(ctx.principal().name.clone()),
                    comment: req.comment.clone(),
                })
            })
            .await
    }

    /// `updateCatalog`: owner, or `MODIFY` on the catalog.
    pub async fn update_catalog(
        &self,
        ctx: &RequestContext,
        name: &str,
        update: UpdateComment,
    ) -> CatalogResult<CatalogInfo> {
        self.audit
            .mutation(ctx, ops::UPDATE_CATALOG, SecurableRef::catalog_param(name), async {
                let owner = self.store.get_catalog(name).ok().and_then(|c| c.owner);
                self.authz
                    .require_owner_or_privilege(
                        ctx,
                        ops::UPDATE_CATALOG,
                        SecurableRef::catalog_param(name),
                        owner.as_deref(),
                        Privilege::Modify,
                    )
                    .await?;
                self.store.update_catalog(name, &update)
            })
            .await
    }

    /// `deleteCatalog`: owner, or `MANAGE` on the catalog. The catalog must be empty.
    pub async fn delete_catalog(&self, ctx: &RequestContext, name: &str) -> CatalogResult<CatalogInfo> {
        self.audit
            .mutation(ctx, ops::DELETE_CATALOG, SecurableRef::catalog_param(name), async {
                let owner = self.store.get_catalog(name).ok().and_then(|c| c.owner);
                self.authz
                    .require_owner_or_privilege(
                        ctx,
                        ops::DELETE_CATALOG,
                        SecurableRef::catalog_param(name),
                        owner.as_deref(),
                        Privilege::Manage,
                    )
                    .await?;
                let removed = self.store.remove_catalog(name)?;
                revoke_grants_on(&self.authz, SecurableKind::Catalog, &removed.name).await?;
                Ok(removed)
            })
            .await
    }

    /// `createSchema`: `CREATE_SCHEMA` on the catalog named in the request.
    pub async fn create_schema(
        &self,
        ctx: &RequestContext,
        req: CreateSchema,
    ) -> CatalogResult<SchemaInfo> {
        self.audit
            .mutation(
                ctx,
                ops::CREATE_SCHEMA,
                SecurableRef::catalog_param(&req.catalog_name),
                async {
                    self.authz
                        .require_privilege(
                            ctx,
                            ops::CREATE_SCHEMA,
                            SecurableRef::catalog_param(&req.catalog_name),
                            Privilege::CreateSchema,
                        )
                        .await?;
                    check_name(&req.name)?;
                    self.store.insert_schema(&req, &ctx.principal().name)
                },
            )
            .await
    }

    /// `updateSchema`: `MODIFY` on the resolved schema.
    pub async fn update_schema(
        &self,
        ctx: &RequestContext,
        full_name: &str,
        update: UpdateComment,
    ) -> CatalogResult<SchemaInfo> {
        let target = SecurableRef::unresolved(SecurableKind::Schema, full_name);
        self.audit
            .mutation(ctx, ops::UPDATE_SCHEMA, target, async {
                let (catalog, name) = split2(full_name)?;
                let schema = resolve(
                    &self.authz,
                    ctx,
                    ops::UPDATE_SCHEMA,
                    catalog,
                    Privilege::Modify,
                    self.store.get_schema(catalog, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::UPDATE_SCHEMA,
                        SecurableRef::resolved(SecurableKind::Schema, &schema.id, &schema.name),
                        Privilege::Modify,
                    )
                    .await?;
                self.store.update_schema(catalog, name, &update)
            })
            .await
    }

    /// `deleteSchema`: `MANAGE` on the resolved schema. The schema must be empty.
    pub async fn delete_schema(&self, ctx: &RequestContext, full_name: &str) -> CatalogResult<SchemaInfo> {
        let target = SecurableRef::unresolved(SecurableKind::Schema, full_name);
        self.audit
            .mutation(ctx, ops::DELETE_SCHEMA, target, async {
                let (catalog, name) = split2(full_name)?;
                let schema = resolve(
                    &self.authz,
                    ctx,
                    ops::DELETE_SCHEMA,
                    catalog,
                    Privilege::Manage,
                    self.store.get_schema(catalog, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::DELETE_SCHEMA,
                        SecurableRef::resolved(SecurableKind::Schema, &schema.id, &schema.name),
                        Privilege::Manage,
                    )
                    .await?;
                let removed = self.store.remove_schema(catalog, name)?;
                revoke_grants_on(&self.authz, SecurableKind::Schema, &removed.id).await?;
                Ok(removed)
            })
            .await
    }

    /// `createTable`: `CREATE_TABLE` on the resolved parent schema.
    pub async fn create_table(&self, ctx: &RequestContext, req: CreateTable) -> CatalogResult<TableInfo> {
        let target = SecurableRef::unresolved(
            SecurableKind::Schema,
            qualified(&[&req.catalog_name, &req.schema_name]),
        );
        self.audit
            .mutation(ctx, ops::CREATE_TABLE, target, async {
                let schema = resolve(
                    &self.authz,
                    ctx,
                    ops::CREATE_TABLE,
                    &req.catalog_name,
                    Privilege::CreateTable,
                    self.store.get_schema(&req.catalog_name, &req.schema_name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::CREATE_TABLE,
                        SecurableRef::resolved(SecurableKind::Schema, &schema.id, &schema.name),
                        Privilege::CreateTable,
                    )
                    .await?;
                check_name(&req.name)?;
                self.store.insert_table(&req, &ctx.principal().name)
            })
            .await
    }

    /// `updateTable`: `MODIFY` on the resolved table.
    pub async fn update_table(
        &self,
        ctx: &RequestContext,
        full_name: &str,
        update: UpdateComment,
    ) -> CatalogResult<TableInfo> {
        let target = SecurableRef::unresolved(SecurableKind::Table, full_name);
        self.audit
            .mutation(ctx, ops::UPDATE_TABLE, target, async {
                let (catalog, schema, name) = split3(full_name)?;
                let table = resolve(
                    &self.authz,
                    ctx,
                    ops::UPDATE_TABLE,
                    catalog,
                    Privilege::Modify,
                    self.store.get_table(catalog, schema, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::UPDATE_TABLE,
                        SecurableRef::resolved(SecurableKind::Table, &table.id, &table.name),
                        Privilege::Modify,
                    )
                    .await?;
                self.store.update_table(&table, &update)
            })
            .await
    }

    /// `deleteTable`: `MANAGE` on the resolved table.
    pub async fn delete_table(&self, ctx: &RequestContext, full_name: &str) -> CatalogResult<TableInfo> {
        let target = SecurableRef::unresolved(SecurableKind::Table, full_name);
        self.audit
            .mutation(ctx, ops::DELETE_TABLE, target, async {
                let (catalog, schema, name) = split3(full_name)?;
                let table = resolve(
                    &self.authz,
                    ctx,
                    ops::DELETE_TABLE,
                    catalog,
                    Privilege::Manage,
                    self.store.get_table(catalog, schema, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::DELETE_TABLE,
                        SecurableRef::resolved(SecurableKind::Table, &table.id, &table.name),
                        Privilege::Manage,
                    )
                    .await?;
                let removed = self.store.remove_table(&table)?;
                revoke_grants_on(&self.authz, SecurableKind::Table, &removed.id).await?;
                Ok(removed)
            })
            .await
    }

    /// `updateColumn`: `MODIFY` on the resolved table.
    pub async fn update_column(
        &self,
        ctx: &RequestContext,
        table_full_name: &str,
        column: &str,
        update: UpdateColumn,
    ) -> CatalogResult<TableInfo> {
        let target = SecurableRef::unresolved(SecurableKind::Table, table_full_name);
        self.audit
            .mutation(ctx, ops::UPDATE_COLUMN, target, async {
                let (catalog, schema, name) = split3(table_full_name)?;
                let table = resolve(
                    &self.authz,
                    ctx,
                    ops::UPDATE_COLUMN,
                    catalog,
                    Privilege::Modify,
                    self.store.get_table(catalog, schema, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::UPDATE_COLUMN,
                        SecurableRef::resolved(SecurableKind::Table, &table.id, &table.name),
                        Privilege::Modify,
                    )
                    .await?;
                self.store.update_column(&table, column, &update)
            })
            .await
    }

    /// `createView`: `CREATE_VIEW` on the resolved parent schema.
    pub async fn create_view(&self, ctx: &RequestContext, req: CreateView) -> CatalogResult<ViewInfo> {
        let target = SecurableRef::unresolved(
            SecurableKind::Schema,
            qualified(&[&req.catalog_name, &req.schema_name]),
        );
        self.audit
            .mutation(ctx, ops::CREATE_VIEW, target, async {
                let schema = resolve(
                    &self.authz,
                    ctx,
                    ops::CREATE_VIEW,
                    &req.catalog_name,
                    Privilege::CreateView,
                    self.store.get_schema(&req.catalog_name, &req.schema_name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::CREATE_VIEW,
                        SecurableRef::resolved(SecurableKind::Schema, &schema.id, &schema.name),
                        Privilege::CreateView,
                    )
                    .await?;
                check_name(&req.name)?;
                self.store.insert_view(&req, &ctx.principal().name)
            })
            .await
    }

    /// `updateView`: `MODIFY` on the resolved view.
    pub async fn update_view(
        &self,
        ctx: &RequestContext,
        full_name: &str,
        update: UpdateComment,
    ) -> CatalogResult<ViewInfo> {
        let target = SecurableRef::unresolved(SecurableKind::View, full_name);
        self.audit
            .mutation(ctx, ops::UPDATE_VIEW, target, async {
                let (catalog, schema, name) = split3(full_name)?;
                let view = resolve(
                    &self.authz,
                    ctx,
                    ops::UPDATE_VIEW,
                    catalog,
                    Privilege::Modify,
                    self.store.get_view(catalog, schema, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::UPDATE_VIEW,
                        SecurableRef::resolved(SecurableKind::View, &view.id, &view.name),
                        Privilege::Modify,
                    )
                    .await?;
                self.store.update_view(&view, &update)
            })
            .await
    }

    /// `deleteView`: `MANAGE` on the resolved view.
    pub async fn delete_view(&self, ctx: &RequestContext, full_name: &str) -> CatalogResult<ViewInfo> {
        let target = SecurableRef::unresolved(SecurableKind::View, full_name);
        self.audit
            .mutation(ctx, ops::DELETE_VIEW, target, async {
                let (catalog, schema, name) = split3(full_name)?;
                let view = resolve(
                    &self.authz,
                    ctx,
                    ops::DELETE_VIEW,
                    catalog,
                    Privilege::Manage,
                    self.store.get_view(catalog, schema, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::DELETE_VIEW,
                        SecurableRef::resolved(SecurableKind::View, &view.id, &view.name),
                        Privilege::Manage,
                    )
                    .await?;
                let removed = self.store.remove_view(&view)?;
                revoke_grants_on(&self.authz, SecurableKind::View, &removed.id).await?;
                Ok(removed)
            })
            .await
    }
}
