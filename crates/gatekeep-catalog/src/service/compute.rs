use super::{check_name, resolve, revoke_grants_on};
use crate::error::CatalogResult;
use crate::model::*;
use crate::ops;
use crate::store::MetadataStore;
use gatekeep_audit::AuditLog;
use gatekeep_authorization::Authorizer;
use gatekeep_core::{Privilege, RequestContext, SecurableKind, SecurableRef};
use std::sync::Arc;

/// Compute endpoints and their principal assignments, all under `MANAGE_COMPUTE`.
///
/// Requests without a catalog are scoped to the configured default catalog.
#[derive(Debug, Clone)]
pub struct ComputeService {
    store: Arc<MetadataStore>,
    authz: Authorizer,
    audit: Arc<AuditLog>,
    default_catalog: String,
}

impl ComputeService {
    /// Service over `store`, enforcing through `authz`. Requests without a
    /// catalog are scoped to `default_catalog`.
    pub fn new(store: Arc<MetadataStore>, authz: Authorizer, default_catalog: impl Into<String>) -> Self {
        let audit = Arc::clone(authz.audit());
        Self {
            store,
            authz,
            audit,
            default_catalog: default_catalog.into(),
        }
    }

    /// `createComputeEndpoint`: `MANAGE_COMPUTE` on the target catalog, before the endpoint exists.
    pub async fn create_compute_endpoint(
        &self,
        ctx: &RequestContext,
        req: CreateComputeEndpoint,
    ) -> CatalogResult<ComputeEndpointInfo> {
        let catalog = req
            .catalog_name
            .clone()
            .unwrap_or_else(|| self.default_catalog.clone());
        self.audit
            .mutation(
                ctx,
                ops::CREATE_COMPUTE_ENDPOINT,
                SecurableRef::catalog_sentinel(&catalog),
                async {
                    self.authz
                        .require_privilege(
                            ctx,
                            ops::CREATE_COMPUTE_ENDPOINT,
                            SecurableRef::catalog_sentinel(&catalog),
                            Privilege::ManageCompute,
                        )
                        .await?;
                    check_name(&req.name)?;
                    self.store
                        .insert_compute_endpoint(&catalog, &req, &ctx.principal().name)
                },
            )
            .await
    }

    /// `updateComputeEndpoint`: `MANAGE_COMPUTE` on the resolved endpoint.
    pub async fn update_compute_endpoint(
        &self,
        ctx: &RequestContext,
        name: &str,
        update: UpdateComputeEndpoint,
    ) -> CatalogResult<ComputeEndpointInfo> {
        let target = SecurableRef::unresolved(SecurableKind::ComputeEndpoint, name);
        self.audit
            .mutation(ctx, ops::UPDATE_COMPUTE_ENDPOINT, target, async {
                let endpoint = resolve(
                    &self.authz,
                    ctx,
                    ops::UPDATE_COMPUTE_ENDPOINT,
                    &self.default_catalog,
                    Privilege::ManageCompute,
                    self.store.get_compute_endpoint(name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::UPDATE_COMPUTE_ENDPOINT,
                        SecurableRef::resolved(
                            SecurableKind::ComputeEndpoint,
                            &endpoint.id,
                            &endpoint.name,
                        ),
                        Privilege::ManageCompute,
                    )
                    .await?;
                self.store.update_compute_endpoint(&endpoint, &update)
            })
            .await
    }

    /// `deleteComputeEndpoint`: `MANAGE_COMPUTE` on the resolved endpoint.
    ///
    /// Drops the endpoint's assignments with it.
    pub async fn delete_compute_endpoint(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> CatalogResult<ComputeEndpointInfo> {
        let target = SecurableRef::unresolved(SecurableKind::ComputeEndpoint, name);
        self.audit
            .mutation(ctx, ops::DELETE_COMPUTE_ENDPOINT, target, async {
                let endpoint = resolve(
                    &self.authz,
                    ctx,
                    ops::DELETE_COMPUTE_ENDPOINT,
                    &self.default_catalog,
                    Privilege::ManageCompute,
                    self.store.get_compute_endpoint(name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::DELETE_COMPUTE_ENDPOINT,
                        SecurableRef::resolved(
                            SecurableKind::ComputeEndpoint,
                            &endpoint.id,
                            &endpoint.name,
                        ),
                        Privilege::ManageCompute,
                    )
                    .await?;
                let removed = self.store.remove_compute_endpoint(&endpoint)?;
                revoke_grants_on(&self.authz, SecurableKind::ComputeEndpoint, &removed.id).await?;
                Ok(removed)
            })
            .await
    }

    /// `createComputeAssignment`: `MANAGE_COMPUTE` on the resolved endpoint.
    ///
    /// Bind `principal` to the endpoint. Idempotent.
    pub async fn create_compute_assignment(
        &self,
        ctx: &RequestContext,
        endpoint_name: &str,
        principal: &str,
    ) -> CatalogResult<ComputeAssignment> {
        let target = SecurableRef::unresolved(SecurableKind::ComputeEndpoint, endpoint_name);
        self.audit
            .mutation(ctx, ops::CREATE_COMPUTE_ASSIGNMENT, target, async {
                let endpoint = resolve(
                    &self.authz,
                    ctx,
                    ops::CREATE_COMPUTE_ASSIGNMENT,
                    &self.default_catalog,
                    Privilege::ManageCompute,
                    self.store.get_compute_endpoint(endpoint_name),
                )
                .await?;
                self.authz
                    .require_privilege(
                        ctx,
                        ops::CREATE_COMPUTE_ASSIGNMENT,
                        SecurableRef::resolved(
                            SecurableKind::ComputeEndpoint,
                            &endpoint.id,
                            &endpoint.name,
                        ),
                        Privilege::ManageCompute,
                    )
                    .await?;
                self.store.insert_compute_assignment(&endpoint, principal)
            })
            .await
    }

    /// Remove an assignment by id. Checked at the default catalog, since the
    /// assignment id alone does not name an endpoint.
    pub async fn delete_compute_assignment(
        &self,
        ctx: &RequestContext,
        assignment_id: &str,
    ) -> CatalogResult<ComputeAssignment> {
        self.audit
            .mutation(
                ctx,
                ops::DELETE_COMPUTE_ASSIGNMENT,
                SecurableRef::catalog_sentinel(&self.default_catalog),
                async {
                    self.authz
                        .require_privilege(
                            ctx,
                            ops::DELETE_COMPUTE_ASSIGNMENT,
                            SecurableRef::catalog_sentinel(&self.default_catalog),
                            Privilege::ManageCompute,
                        )
                        .await?;
                    self.store.remove_compute_assignment(assignment_id)
                },
            )
            .await
    }
}
