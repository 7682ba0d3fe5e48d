use super::{check_name, resolve, revoke_grants_on, split2};
use crate::error::CatalogResult;
use crate::model::*;
use crate::ops;
use crate::store::MetadataStore;
use gatekeep_audit::AuditLog;
use gatekeep_authorization::Authorizer;
use gatekeep_core::{Privilege, RequestContext, SecurableKind, SecurableRef};
use std::sync::Arc;

/// Volumes, storage credentials and external locations. All are
/// catalog-scoped; creation is checked against the parent catalog before the
/// object exists.
#[derive(Debug, Clone)]
pub struct StorageService {
    store: Arc<MetadataStore>,
    authz: Authorizer,
    audit: Arc<AuditLog>,
}

impl StorageService {
    /// Service over `store`, enforcing through `authz`.
    pub fn new(store: Arc<MetadataStore>, authz: Authorizer) -> Self {
        let audit = Arc::clone(authz.audit());
        Self {
            store,
            authz,
            audit,
        }
    }

    /// `createVolume`: `CREATE_VOLUME` on the parent catalog, before the volume exists.
    pub async fn create_volume(&self, ctx: &RequestContext, req: CreateVolume) -> CatalogResult<VolumeInfo> {
        self.audit
            .mutation(
                ctx,
                ops::CREATE_VOLUME,
                SecurableRef::catalog_sentinel(&req.catalog_name),
                async {
                    self.authz
                        .require_privilege(
                            ctx,
                            ops::CREATE_VOLUME,
                            SecurableRef::catalog_sentinel(&req.catalog_name),
                            Privilege::CreateVolume,
                        )
                        .await?;
                    check_name(&req.name)?;
                    self.store.insert_volume(&req, &ctx.principal().name)
                },
            )
            .await
    }

    /// `updateVolume`: `MODIFY` on the resolved volume.
    pub async fn update_volume(
        &self,
        ctx: &RequestContext,
        full_name: &str,
        update: UpdateComment,
    ) -> CatalogResult<VolumeInfo> {
        let target = SecurableRef::unresolved(SecurableKind::Volume, full_name);
        self.audit
            .mutation(ctx, ops::UPDATE_VOLUME, target, async {
                let (catalog, name) = split2(full_name)?;
                let volume = resolve(
                    &self.authz,
                    ctx,
                    ops::UPDATE_VOLUME,
                    catalog,
                    Privilege::Modify,
                    self.store.get_volume(catalog, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::UPDATE_VOLUME,
                        SecurableRef::resolved(SecurableKind::Volume, &volume.id, &volume.name),
                        Privilege::Modify,
                    )
                    .await?;
                self.store.update_volume(&volume, &update)
            })
            .await
    }

    /// `deleteVolume`: `MANAGE` on the resolved volume.
    pub async fn delete_volume(&self, ctx: &RequestContext, full_name: &str) -> CatalogResult<VolumeInfo> {
        let target = SecurableRef::unresolved(SecurableKind::Volume, full_name);
        self.audit
            .mutation(ctx, ops::DELETE_VOLUME, target, async {
                let (catalog, name) = split2(full_name)?;
                let volume = resolve(
                    &self.authz,
                    ctx,
                    ops::DELETE_VOLUME,
                    catalog,
                    Privilege::Manage,
                    self.store.get_volume(catalog, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::DELETE_VOLUME,
                        SecurableRef::resolved(SecurableKind::Volume, &volume.id, &volume.name),
                        Privilege::Manage,
                    )
                    .await?;
                let removed = self.store.remove_volume(&volume)?;
                revoke_grants_on(&self.authz, SecurableKind::Volume, &removed.id).await?;
                Ok(removed)
            })
            .await
    }

    /// `createStorageCredential`: `CREATE_STORAGE_CREDENTIAL` on the parent catalog.
    pub async fn create_storage_credential(
        &self,
        ctx: &RequestContext,
        req: CreateStorageCredential,
    ) -> CatalogResult<StorageCredentialInfo> {
        self.audit
            .mutation(
                ctx,
                ops::CREATE_STORAGE_CREDENTIAL,
                SecurableRef::catalog_sentinel(&req.catalog_name),
                async {
                    self.authz
                        .require_privilege(
                            ctx,
                            ops::CREATE_STORAGE_CREDENTIAL,
                            SecurableRef::catalog_sentinel(&req.catalog_name),
                            Privilege::CreateStorageCredential,
                        )
                        .await?;
                    check_name(&req.name)?;
                    self.store
                        .insert_storage_credential(&req, &ctx.principal().name)
                },
            )
            .await
    }

    /// `updateStorageCredential`: `MODIFY` on the resolved credential.
    pub async fn update_storage_credential(
        &self,
        ctx: &RequestContext,
        full_name: &str,
        update: UpdateComment,
    ) -> CatalogResult<StorageCredentialInfo> {
        let target = SecurableRef::unresolved(SecurableKind::StorageCredential, full_name);
        self.audit
            .mutation(ctx, ops::UPDATE_STORAGE_CREDENTIAL, target, async {
                let (catalog, name) = split2(full_name)?;
                let credential = resolve(
                    &self.authz,
                    ctx,
                    ops::UPDATE_STORAGE_CREDENTIAL,
                    catalog,
                    Privilege::Modify,
                    self.store.get_storage_credential(catalog, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::UPDATE_STORAGE_CREDENTIAL,
                        SecurableRef::resolved(
                            SecurableKind::StorageCredential,
                            &credential.id,
                            &credential.name,
                        ),
                        Privilege::Modify,
                    )
                    .await?;
                self.store.update_storage_credential(&credential, &update)
            })
            .await
    }

    /// `deleteStorageCredential`: `MANAGE` on the resolved credential.
    ///
    /// Refused while an external location still uses the credential.
    pub async fn delete_storage_credential(
        &self,
        ctx: &RequestContext,
        full_name: &str,
    ) -> CatalogResult<StorageCredentialInfo> {
        let target = SecurableRef::unresolved(SecurableKind::StorageCredential, full_name);
        self.audit
            .mutation(ctx, ops::DELETE_STORAGE_CREDENTIAL, target, async {
                let (catalog, name) = split2(full_name)?;
                let credential = resolve(
                    &self.authz,
                    ctx,
                    ops::DELETE_STORAGE_CREDENTIAL,
                    catalog,
                    Privilege::Manage,
                    self.store.get_storage_credential(catalog, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::DELETE_STORAGE_CREDENTIAL,
                        SecurableRef::resolved(
                            SecurableKind::StorageCredential,
                            &credential.id,
                            &credential.name,
                        ),
                        Privilege::Manage,
                    )
                    .await?;
                let removed = self.store.remove_storage_credential(&credential)?;
                revoke_grants_on(&self.authz, SecurableKind::StorageCredential, &removed.id).await?;
                Ok(removed)
            })
            .await
    }

    /// `createExternalLocation`: `CREATE_EXTERNAL_LOCATION` on the parent catalog.
    ///
    /// The referenced credential must already exist in the same catalog.
    pub async fn create_external_location(
        &self,
        ctx: &RequestContext,
        req: CreateExternalLocation,
    ) -> CatalogResult<ExternalLocationInfo> {
        self.audit
            .mutation(
                ctx,
                ops::CREATE_EXTERNAL_LOCATION,
                SecurableRef::catalog_sentinel(&req.catalog_name),
                async {
                    self.authz
                        .require_privilege(
                            ctx,
                            ops::CREATE_EXTERNAL_LOCATION,
                            SecurableRef::catalog_sentinel(&req.catalog_name),
                            Privilege::CreateExternalLocation,
                        )
                        .await?;
                    check_name(&req.name)?;
                    self.store
                        .insert_external_location(&req, &ctx.principal().name)
                },
            )
            .await
    }

    /// `updateExternalLocation`: `MODIFY` on the resolved location.
    pub async fn update_external_location(
        &self,
        ctx: &RequestContext,
        full_name: &str,
        update: UpdateComment,
    ) -> CatalogResult<ExternalLocationInfo> {
        let target = SecurableRef::unresolved(SecurableKind::ExternalLocation, full_name);
        self.audit
            .mutation(ctx, ops::UPDATE_EXTERNAL_LOCATION, target, async {
                let (catalog, name) = split2(full_name)?;
                let location = resolve(
                    &self.authz,
                    ctx,
                    ops::UPDATE_EXTERNAL_LOCATION,
                    catalog,
                    Privilege::Modify,
                    self.store.get_external_location(catalog, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::UPDATE_EXTERNAL_LOCATION,
                        SecurableRef::resolved(
                            SecurableKind::ExternalLocation,
                            &location.id,
                            &location.name,
                        ),
                        Privilege::Modify,
                    )
                    .await?;
                self.store.update_external_location(&location, &update)
            })
            .await
    }

    /// `deleteExternalLocation`: `MANAGE` on the resolved location.
    pub async fn delete_external_location(
        &self,
        ctx: &RequestContext,
        full_name: &str,
    ) -> CatalogResult<ExternalLocationInfo> {
        let target = SecurableRef::unresolved(SecurableKind::ExternalLocation, full_name);
        self.audit
            .mutation(ctx, ops::DELETE_EXTERNAL_LOCATION, target, async {
                let (catalog, name) = split2(full_name)?;
                let location = resolve(
                    &self.authz,
                    ctx,
                    ops::DELETE_EXTERNAL_LOCATION,
                    catalog,
                    Privilege::Manage,
                    self.store.get_external_location(catalog, name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::DELETE_EXTERNAL_LOCATION,
                        SecurableRef::resolved(
                            SecurableKind::ExternalLocation,
                            &location.id,
                            &location.name,
                        ),
                        Privilege::Manage,
                    )
                    .await?;
                let removed = self.store.remove_external_location(&location)?;
                revoke_grants_on(&self.authz, SecurableKind::ExternalLocation, &removed.id).await?;
                Ok(removed)
            })
            .await
    }
}
