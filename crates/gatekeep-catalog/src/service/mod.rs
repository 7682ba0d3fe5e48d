//! Guarded service methods.
//!
//! Every state-changing method runs inside [`AuditLog::mutation`] and enforces
//! through the [`Authorizer`] before touching the store. Methods on
//! already-existing objects look the object up first and check against its
//! resolved id.
//!
//! [`AuditLog::mutation`]: gatekeep_audit::AuditLog::mutation

mod catalog;
mod compute;
mod grants;
mod storage;

pub use catalog::CatalogService;
pub use compute::ComputeService;
pub use grants::GrantService;
pub use storage::StorageService;

use crate::error::{CatalogError, CatalogResult};
use gatekeep_authorization::Authorizer;
use gatekeep_core::{Privilege, RequestContext, SecurableKind, SecurableRef};
use tracing::debug;

/// Pass a lookup through, deciding what a failed one may reveal.
///
/// A not-found result reaches the caller only if the check routine lets it;
/// otherwise the caller gets the same refusal an existing object would give.
pub(crate) async fn resolve<T>(
    authz: &Authorizer,
    ctx: &RequestContext,
    operation: &str,
    catalog: &str,
    privilege: Privilege,
    lookup: CatalogResult<T>,
) -> CatalogResult<T> {
    match lookup {
        Err(CatalogError::NotFound { kind, name }) => {
            authz
                .reveal_not_found(
                    ctx,
                    operation,
                    SecurableRef::unresolved(kind, name.clone()),
                    catalog,
                    privilege,
                )
                .await?;
            Err(CatalogError::NotFound { kind, name })
        }
        other => other,
    }
}

/// Drop every grant on a securable that has just been deleted, so a later
/// object reusing its grant id starts clean.
pub(crate) async fn revoke_grants_on(
    authz: &Authorizer,
    kind: SecurableKind,
    id: &str,
) -> CatalogResult<()> {
    let revoked = authz.grants().remove_grants_on(kind, id).await?;
    debug!(%kind, id, revoked, "grants on deleted securable revoked");
    Ok(())
}

/// Split `catalog.name`.
pub(crate) fn split2(full_name: &str) -> CatalogResult<(&str, &str)> {
    match full_name.split('.').collect::<Vec<_>>().as_slice() {
        [catalog, name] if !catalog.is_empty() && !name.is_empty() => Ok((*catalog, *name)),
        _ => Err(CatalogError::invalid(format!(
            "expected `catalog.name`, got `{full_name}`"
        ))),
    }
}

/// Split `catalog.schema.name`.
pub(crate) fn split3(full_name: &str) -> CatalogResult<(&str, &str, &str)> {
    match full_name.split('.').collect::<Vec<_>>().as_slice() {
        [catalog, schema, name]
            if !catalog.is_empty() && !schema.is_empty() && !name.is_empty() =>
        {
            Ok((*catalog, *schema, *name))
        }
        _ => Err(CatalogError::invalid(format!(
            "expected `catalog.schema.name`, got `{full_name}`"
        ))),
    }
}

/// Object names are single, non-empty segments.
pub(crate) fn check_name(name: &str) -> CatalogResult<()> {
    if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
        return Err(CatalogError::invalid(format!("invalid name `{name}`")));
    }
    Ok(())
}
