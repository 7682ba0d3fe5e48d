//! The mutation-audit rule.
//!
//! Every mutating method on a `*Service` or `*Manager` that takes a
//! `&RequestContext` runs inside the mutation audit wrapper, unless it is
//! listed in [`AUDIT_EXEMPTIONS`]. Raw privilege decisions must be paired with
//! a denial audit in the same method.

use crate::inspect::MethodEvidence;
use crate::verify::ContractMismatch;
use gatekeep_audit::{exemption_for, AUDIT_EXEMPTIONS};

/// Method-name stems that mark a state-changing method. A stem matches the
/// whole name or a `stem_` prefix.
pub const MUTATING_PREFIXES: &[&str] = &[
    "create", "update", "delete", "register", "bind", "unbind", "assign", "unassign", "trigger",
    "execute", "run", "cancel", "close", "purge", "profile", "reorder", "attach", "set", "grant",
    "revoke",
];

const GUARDED_SUFFIXES: &[&str] = &["Service", "Manager"];

/// Whether `method` is named like a mutation.
pub fn is_mutating_name(method: &str) -> bool {
    MUTATING_PREFIXES.iter().any(|stem| {
        method == *stem
            || method
                .strip_prefix(stem)
                .is_some_and(|rest| rest.starts_with('_'))
    })
}

fn is_guarded_receiver(receiver: &str) -> bool {
    GUARDED_SUFFIXES.iter().any(|suffix| receiver.ends_with(suffix))
}

/// Apply the rule to `(file, method)` pairs.
pub fn check(methods: &[(String, MethodEvidence)]) -> Vec<ContractMismatch> {
    let mut findings = Vec::new();

    for (file, method) in methods {
        if let Some(line) = method.raw_check_line() {
            if !method.has_denial_audit() {
                findings.push(ContractMismatch::UnpairedRawCheck {
                    method: method.qualified(),
                    line,
                });
            }
        }

        if !is_guarded_receiver(&method.receiver)
            || !method.takes_context
            || !is_mutating_name(&method.method)
            || method.has_mutation_audit()
        {
            continue;
        }
        if exemption_for(&method.qualified()).is_none() {
            findings.push(ContractMismatch::MissingMutationAudit {
                method: method.qualified(),
                file: file.clone(),
                line: method.line,
            });
        }
    }

    for exemption in AUDIT_EXEMPTIONS {
        if !methods.iter().any(|(_, m)| m.qualified() == exemption.method) {
            findings.push(ContractMismatch::StaleExemption {
                method: exemption.method.to_string(),
            });
        }
    }
    findings
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::inspect::inspect_source;
    use assert_matches::assert_matches;

    fn scan(source: &str) -> Vec<(String, MethodEvidence)> {
        inspect_source(source)
            .unwrap()
            .into_iter()
            .map(|m| ("service.rs".to_string(), m))
            .collect()
    }

    const ATTACH: &str = r#"
        impl CatalogService {
            async fn attach_all(&self, ctx: &RequestContext, names: &[String]) {
                self.audit.system_event(op, "catalog:*", None).await?;
            }
        }
    "#;

    #[test]
    fn mutating_names() {
        assert!(is_mutating_name("create_table"));
        assert!(is_mutating_name("grant"));
        assert!(is_mutating_name("attach_all"));
        assert!(!is_mutating_name("grants_for"));
        assert!(!is_mutating_name("list_grants"));
        assert!(!is_mutating_name("settings"));
        for name in [
            "cancel_query",
            "close_session",
            "purge_audit",
            "profile_table",
            "unbind_endpoint",
            "run_job",
        ] {
            assert!(is_mutating_name(name), "{name}");
        }
        assert!(!is_mutating_name("running_jobs"));
        assert!(!is_mutating_name("closed_sessions"));
    }

    #[test]
    fn unwrapped_mutation_is_reported() {
        let source = format!(
            "{ATTACH}{}",
            r#"
            impl VolumeService {
                async fn delete_volume(&self, ctx: &RequestContext, name: &str) {
                    self.authz.require_privilege(ctx, op, r, Privilege::Manage).await?;
                }
                async fn list_volumes(&self, ctx: &RequestContext) {}
                fn create_id(&self) {}
            }
            "#
        );
        let findings = check(&scan(&source));
        assert_matches!(
            findings.as_slice(),
            [ContractMismatch::MissingMutationAudit { method, .. }] if method == "VolumeService::delete_volume"
        );
    }

    #[test]
    fn exempt_method_passes_and_missing_one_goes_stale() {
        assert!(check(&scan(ATTACH)).is_empty());

        let findings = check(&scan("impl CatalogService {}"));
        assert_matches!(
            findings.as_slice(),
            [ContractMismatch::StaleExemption { method }] if method == "CatalogService::attach_all"
        );
    }

    #[test]
    fn raw_check_needs_a_denial_audit() {
        let source = format!(
            "{ATTACH}{}",
            r#"
            impl Gate {
                async fn peek(&self, ctx: &RequestContext) -> bool {
                    self.grants.has_privilege(p, k, id, v).await
                }
                async fn enforce(&self, ctx: &RequestContext) {
                    if !self.grants.has_privilege(p, k, id, v).await {
                        self.audit.record_denial(ctx, op, &denial).await;
                    }
                }
            }
            "#
        );
        let findings = check(&scan(&source));
        assert_matches!(
            findings.as_slice(),
            [ContractMismatch::UnpairedRawCheck { method, .. }] if method == "Gate::peek"
        );
    }
}
