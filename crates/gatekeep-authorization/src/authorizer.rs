//! The check routine.

use crate::decision::{AllowReason, AuthzDecision};
use gatekeep_audit::AuditLog;
use gatekeep_core::{
    is_valid_privilege_for_kind, AuthzError, AuthzResult, Denial, DenialReason, Principal,
    Privilege, RequestContext, SecurableId, SecurableKind, SecurableRef,
};
use gatekeep_grants::GrantStore;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Shared check routine. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Authorizer {
    grants: Arc<dyn GrantStore>,
    audit: Arc<AuditLog>,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

impl Authorizer {
    /// Check routine over a grant store, reporting denials to `audit`.
    pub fn new(grants: Arc<dyn GrantStore>, audit: Arc<AuditLog>) -> Self {
        Self { grants, audit }
    }

    /// The audit log denials are written to.
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// The grant store decisions are read from.
    pub fn grants(&self) -> &Arc<dyn GrantStore> {
        &self.grants
    }

    /// Admin flag on the principal, or in the grant store.
    pub async fn is_admin(&self, principal: &Principal) -> AuthzResult<bool> {
        if principal.is_admin {
            return Ok(true);
        }
        self.grants.is_admin(&principal.name).await
    }

    /// Pure decision. Validates the request, then consults the admin fast path
    /// and the grant store. Store failures propagate; they never decide.
    pub async fn evaluate(
        &self,
        principal: &Principal,
        securable: &SecurableRef,
        privilege: Privilege,
    ) -> AuthzResult<AuthzDecision> {
        validate(securable, privilege)?;

        if self.is_admin(principal).await? {
            debug!(principal = %principal.name, securable = %securable, %privilege, "admin bypass");
            return Ok(AuthzDecision::allowed(AllowReason::Admin));
        }

        let granted = self
            .grants
            .has_privilege(
                &principal.name,
                securable.kind(),
                securable.grant_id(),
                privilege,
            )
            .await?;

        debug!(principal = %principal.name, securable = %securable, %privilege, granted, "privilege decision");
        if granted {
            Ok(AuthzDecision::allowed(AllowReason::Grant))
        } else {
            Ok(AuthzDecision::Denied(Denial::missing_privilege(
                principal.name.clone(),
                securable.clone(),
                privilege,
            )))
        }
    }

    /// Raw yes/no answer with no audit side effect.
    pub async fn has_privilege(
        &self,
        principal: &Principal,
        securable: &SecurableRef,
        privilege: Privilege,
    ) -> AuthzResult<bool> {
        Ok(self.evaluate(principal, securable, privilege).await?.is_allowed())
    }

    /// Enforce `privilege` on `securable`.
    ///
    /// On refusal the denial record is written before the error is returned.
    pub async fn require_privilege(
        &self,
        ctx: &RequestContext,
        operation: &str,
        securable: SecurableRef,
        privilege: Privilege,
    ) -> AuthzResult<()> {
        match self.evaluate(ctx.principal(), &securable, privilege).await? {
            AuthzDecision::Allowed { .. } => Ok(()),
            AuthzDecision::Denied(denial) => self.deny(ctx, operation, denial).await,
        }
    }

    /// Owner-or-privilege decision with no audit side effect.
    ///
    /// `owner` is the recorded owner of `securable`, if it has one. The owner
    /// bypass covers every privilege passed here. A non-owner falls back to
    /// [`evaluate`](Self::evaluate); when an owner is recorded its denial is
    /// marked [`DenialReason::NotOwner`].
    pub async fn evaluate_owner_or_privilege(
        &self,
        principal: &Principal,
        securable: &SecurableRef,
        owner: Option<&str>,
        privilege: Privilege,
    ) -> AuthzResult<AuthzDecision> {
        validate(securable, privilege)?;

        if owner == Some(principal.name.as_str()) {
            debug!(principal = %principal.name, securable = %securable, "owner bypass");
            return Ok(AuthzDecision::allowed(AllowReason::Owner));
        }

        Ok(match self.evaluate(principal, securable, privilege).await? {
            AuthzDecision::Denied(mut denial) if owner.is_some() => {
                denial.reason = DenialReason::NotOwner;
                AuthzDecision::Denied(denial)
            }
            decision => decision,
        })
    }

    /// Owner first, privilege as fallback. On refusal the denial record is
    /// written before the error is returned.
    pub async fn require_owner_or_privilege(
        &self,
        ctx: &RequestContext,
        operation: &str,
        securable: SecurableRef,
        owner: Option<&str>,
        privilege: Privilege,
    ) -> AuthzResult<()> {
        match self
            .evaluate_owner_or_privilege(ctx.principal(), &securable, owner, privilege)
            .await?
        {
            AuthzDecision::Allowed { .. } => Ok(()),
            AuthzDecision::Denied(denial) => self.deny(ctx, operation, denial).await,
        }
    }

    /// Admin-only guard for grant administration. Ordinary grants never
    /// satisfy it.
    pub async fn require_admin(
        &self,
        ctx: &RequestContext,
        operation: &str,
        target: SecurableRef,
    ) -> AuthzResult<()> {
        let principal = ctx.principal();
        if self.is_admin(principal).await? {
            debug!(principal = %principal.name, target = %target, "admin guard passed");
            return Ok(());
        }
        self.deny(ctx, operation, Denial::admin_required(principal.name.clone(), target))
            .await
    }

    /// Decide what a caller may learn about a lookup that found nothing.
    ///
    /// `Ok(())` means the caller may be told the object does not exist: it is
    /// an admin, or it holds `privilege` on `catalog` (falling back to `MANAGE`
    /// when `privilege` does not apply to catalogs). Anyone else gets the
    /// refusal an existing object of that name would produce: same reason,
    /// same rendered name. Only the audit record says the target was missing.
    pub async fn reveal_not_found(
        &self,
        ctx: &RequestContext,
        operation: &str,
        requested: SecurableRef,
        catalog: &str,
        privilege: Privilege,
    ) -> AuthzResult<()> {
        let catalog_privilege = if is_valid_privilege_for_kind(SecurableKind::Catalog, privilege) {
            privilege
        } else {
            Privilege::Manage
        };
        let scope = SecurableRef::catalog_param(catalog);
        if self
            .evaluate(ctx.principal(), &scope, catalog_privilege)
            .await?
            .is_allowed()
        {
            return Ok(());
        }

        let short_name = requested
            .grant_id()
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string();
        let denial = Denial::missing_privilege(
            ctx.principal().name.clone(),
            requested.with_label(short_name),
            privilege,
        );
        warn!(
            principal = %denial.principal,
            securable = %denial.securable,
            privilege = %privilege,
            operation,
            request_id = %ctx.request_id(),
            "access denied"
        );
        self.audit
            .record_concealed_denial(ctx, operation, &denial)
            .await?;
        Err(AuthzError::access_denied(denial))
    }

    async fn deny(&self, ctx: &RequestContext, operation: &str, denial: Denial) -> AuthzResult<()> {
        warn!(
            principal = %denial.principal,
            securable = %denial.securable,
            privilege = ?denial.privilege,
            operation,
            request_id = %ctx.request_id(),
            "access denied"
        );
        self.audit.record_denial(ctx, operation, &denial).await?;
        Err(AuthzError::access_denied(denial))
    }
}

fn validate(securable: &SecurableRef, privilege: Privilege) -> AuthzResult<()> {
    if let SecurableId::Unresolved(name) = securable.id() {
        error!(securable = %securable, "check against an unresolved name");
        return Err(AuthzError::validation(format!(
            "{} `{name}` must be resolved to its id before it is checked",
            securable.kind()
        )));
    }
    if !is_valid_privilege_for_kind(securable.kind(), privilege) {
        error!(securable = %securable, %privilege, "privilege does not apply to securable kind");
        return Err(AuthzError::validation(format!(
            "{privilege} does not apply to {}",
            securable.kind()
        )));
    }
    Ok(())
}
