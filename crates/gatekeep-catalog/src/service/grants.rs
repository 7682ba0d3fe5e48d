use super::{split2, split3};
use crate::error::{CatalogError, CatalogResult};
use crate::model::GrantRequest;
use crate::ops;
use crate::store::MetadataStore;
use gatekeep_audit::AuditLog;
use gatekeep_authorization::Authorizer;
use gatekeep_core::{is_valid_privilege_for_kind, RequestContext, SecurableKind, SecurableRef};
use gatekeep_grants::Grant;
use std::sync::Arc;
use tracing::info;

/// Grant administration. Admin-only: holding a privilege never lets a
/// principal hand it on.
#[derive(Debug, Clone)]
pub struct GrantService {
    store: Arc<MetadataStore>,
    authz: Authorizer,
    audit: Arc<AuditLog>,
}

impl GrantService {
    /// Service over `store`, administering grants through `authz`.
    pub fn new(store: Arc<MetadataStore>, authz: Authorizer) -> Self {
        let audit = Arc::clone(authz.audit());
        Self {
            store,
            authz,
            audit,
        }
    }

    /// `createGrant`. Granting an existing grant succeeds without change.
    pub async fn grant(&self, ctx: &RequestContext, req: GrantRequest) -> CatalogResult<Grant> {
        let target = SecurableRef::unresolved(req.securable_type, &req.full_name);
        self.audit
            .mutation(ctx, ops::CREATE_GRANT, target, async {
                self.authz
                    .require_admin(
                        ctx,
                        ops::CREATE_GRANT,
                        SecurableRef::unresolved(req.securable_type, &req.full_name),
                    )
                    .await?;
                let grant = self.to_grant(&req)?;
                self.authz.grants().add_grant(grant.clone()).await?;
                info!(grant = %grant, by = %ctx.principal().name, "privilege granted");
                Ok(grant)
            })
            .await
    }

    /// `deleteGrant`. Revoking a grant that does not exist succeeds.
    pub async fn revoke(&self, ctx: &RequestContext, req: GrantRequest) -> CatalogResult<Grant> {
        let target = SecurableRef::unresolved(req.securable_type, &req.full_name);
        self.audit
            .mutation(ctx, ops::DELETE_GRANT, target, async {
                self.authz
                    .require_admin(
                        ctx,
                        ops::DELETE_GRANT,
                        SecurableRef::unresolved(req.securable_type, &req.full_name),
                    )
                    .await?;
                let grant = self.to_grant(&req)?;
                self.authz.grants().remove_grant(&grant).await?;
                info!(grant = %grant, by = %ctx.principal().name, "privilege revoked");
                Ok(grant)
            })
            .await
    }

    /// `listGrants`: every grant held by `principal`. Read-only.
    pub async fn list_grants(&self, ctx: &RequestContext, principal: &str) -> CatalogResult<Vec<Grant>> {
        self.authz
            .require_admin(
                ctx,
                ops::LIST_GRANTS,
                SecurableRef::unresolved(SecurableKind::Catalog, "*"),
            )
            .await?;
        Ok(self.authz.grants().grants_for(principal).await?)
    }

    fn to_grant(&self, req: &GrantRequest) -> CatalogResult<Grant> {
        if !is_valid_privilege_for_kind(req.securable_type, req.privilege) {
            return Err(CatalogError::invalid(format!(
                "{} cannot be granted on a {}",
                req.privilege, req.securable_type
            )));
        }
        let id = self.grant_id(req.securable_type, &req.full_name)?;
        Ok(Grant::new(
            req.principal.clone(),
            req.securable_type,
            id,
            req.privilege,
        ))
    }

    /// Grants are keyed by durable id; catalogs by name.
    fn grant_id(&self, kind: SecurableKind, full_name: &str) -> CatalogResult<String> {
        let store = &self.store;
        Ok(match kind {
            SecurableKind::Catalog => store.get_catalog(full_name)?.name,
            SecurableKind::Schema => {
                let (catalog, name) = split2(full_name)?;
                store.get_schema(catalog, name)?.id
            }
            SecurableKind::Table => {
                let (catalog, schema, name) = split3(full_name)?;
                store.get_table(catalog, schema, name)?.id
            }
            SecurableKind::View => {
                let (catalog, schema, name) = split3(full_name)?;
                store.get_view(catalog, schema, name)?.id
            }
            SecurableKind::Volume => {
                let (catalog, name) = split2(full_name)?;
                store.get_volume(catalog, name)?.id
            }
            SecurableKind::StorageCredential => {
                let (catalog, name) = split2(full_name)?;
                store.get_storage_credential(catalog, name)?.id
            }
            SecurableKind::ExternalLocation => {
                let (catalog, name) = split2(full_name)?;
                store.get_external_location(catalog, name)?.id
            }
            SecurableKind::ComputeEndpoint => store.get_compute_endpoint(full_name)?.id,
        })
    }
}
