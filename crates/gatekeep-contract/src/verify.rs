//! Contract parity: the declared registry against the enforcement calls
//! actually present in each handler.

use crate::audit_rule;
use crate::inspect::{inspect_source, Evidence, MethodEvidence};
use crate::manifest::HandlerManifest;
use crate::registry::{AuthzContract, ContractEntry, ContractRegistry, RegistryError};
use gatekeep_core::{AuthzMode, Privilege, SecurableIdSource, SecurableKind};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A divergence between what is declared and what the code does.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractMismatch {
    #[error("{operation_id}: handler exists but no contract is declared")]
    MissingContract { operation_id: String },

    #[error("{operation_id}: contract declared but no handler is bound")]
    MissingHandler { operation_id: String },

    #[error("{operation_id}: {method} not found in {file}")]
    MissingMethod {
        operation_id: String,
        method: String,
        file: String,
    },

    #[error("{operation_id}: declared {expected}, but {method} never calls the check routine")]
    MissingCheck {
        operation_id: String,
        method: String,
        expected: AuthzMode,
    },

    #[error("{operation_id}: declared {expected}, code enforces {found} at line {line}")]
    ModeDrift {
        operation_id: String,
        expected: AuthzMode,
        found: AuthzMode,
        line: usize,
    },

    #[error("{operation_id}: declared securable {expected}, code checks {found} at line {line}")]
    SecurableTypeDrift {
        operation_id: String,
        expected: SecurableKind,
        found: Found,
        line: usize,
    },

    #[error("{operation_id}: declared {expected}, code checks {found} at line {line}")]
    PrivilegeDrift {
        operation_id: String,
        expected: Privilege,
        found: Found,
        line: usize,
    },

    #[error("{operation_id}: declared id source {expected}, code uses {found} at line {line}")]
    SourceDrift {
        operation_id: String,
        expected: SecurableIdSource,
        found: Found,
        line: usize,
    },

    #[error("{operation_id}: runtime-resolved check at line {line} has no lookup")]
    MissingLookup { operation_id: String, line: usize },

    #[error("{operation_id}: lookup {lookup} at line {lookup_line} runs after the check at line {check_line}")]
    LookupAfterCheck {
        operation_id: String,
        lookup: String,
        lookup_line: usize,
        check_line: usize,
    },

    #[error("{operation_id}: admin_only handler also checks a privilege at line {line}")]
    PrivilegeCheckInAdminOnly { operation_id: String, line: usize },

    #[error("{method}: raw privilege decision at line {line} without a denial audit")]
    UnpairedRawCheck { method: String, line: usize },

    #[error("{method}: mutating method is not wrapped in the mutation audit")]
    MissingMutationAudit { method: String, file: String, line: usize },

    #[error("{method}: audit exemption names a method that no longer exists")]
    StaleExemption { method: String },
}

/// What the code showed where a literal value was expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Found {
    /// A literal that differs from the declaration
    Value(String),
    /// Nothing literal to compare against
    Unknown,
}

impl Found {
    fn from_option<T: fmt::Display>(value: Option<T>) -> Self {
        value.map_or(Found::Unknown, |v| Found::Value(v.to_string()))
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Value(value) => f.write_str(value),
            Found::Unknown => f.write_str("a non-literal argument"),
        }
    }
}

/// Verification could not run.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Outcome of a verification run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    /// Operations compared against their handler
    pub operations_checked: usize,
    /// Service methods seen by the audit rule
    pub methods_scanned: usize,
    /// Every divergence found
    pub findings: Vec<ContractMismatch>,
}

impl VerificationReport {
    /// No findings.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Compare one operation's contract with the evidence from its handler.
pub fn verify_method(entry: &ContractEntry, evidence: &MethodEvidence) -> Vec<ContractMismatch> {
    let operation_id = entry.operation_id.clone();
    let mut findings = Vec::new();

    let Some(first) = evidence.checks().next() else {
        return vec![ContractMismatch::MissingCheck {
            operation_id,
            method: evidence.qualified(),
            expected: entry.contract.mode(),
        }];
    };

    let check = match entry.contract {
        AuthzContract::AdminOnly => {
            for site in evidence.checks().filter(|s| s.mode != AuthzMode::AdminOnly) {
                findings.push(ContractMismatch::PrivilegeCheckInAdminOnly {
                    operation_id: operation_id.clone(),
                    line: site.line,
                });
            }
            if let Some(line) = evidence.raw_check_line() {
                findings.push(ContractMismatch::PrivilegeCheckInAdminOnly {
                    operation_id: operation_id.clone(),
                    line,
                });
            }
            if !evidence.checks().any(|s| s.mode == AuthzMode::AdminOnly) {
                findings.push(ContractMismatch::ModeDrift {
                    operation_id,
                    expected: AuthzMode::AdminOnly,
                    found: first.mode,
                    line: first.line,
                });
            }
            return findings;
        }
        AuthzContract::Privilege(check) | AuthzContract::OwnerOrPrivilege(check) => check,
    };

    for site in evidence.checks() {
        if site.mode != entry.contract.mode() {
            findings.push(ContractMismatch::ModeDrift {
                operation_id: operation_id.clone(),
                expected: entry.contract.mode(),
                found: site.mode,
                line: site.line,
            });
            continue;
        }
        let kind = site.securable.as_ref().and_then(|s| s.kind);
        if kind != Some(check.securable_type) {
            findings.push(ContractMismatch::SecurableTypeDrift {
                operation_id: operation_id.clone(),
                expected: check.securable_type,
                found: Found::from_option(kind),
                line: site.line,
            });
        }
        if site.privilege != Some(check.privilege) {
            findings.push(ContractMismatch::PrivilegeDrift {
                operation_id: operation_id.clone(),
                expected: check.privilege,
                found: Found::from_option(site.privilege),
                line: site.line,
            });
        }
        let source = site.securable.as_ref().and_then(|s| s.source);
        if source != Some(check.securable_id_source) {
            findings.push(ContractMismatch::SourceDrift {
                operation_id: operation_id.clone(),
                expected: check.securable_id_source,
                found: Found::from_option(source),
                line: site.line,
            });
        }
    }

    if check.securable_id_source.requires_lookup() {
        findings.extend(lookup_order(&operation_id, evidence));
    }
    findings
}

/// A runtime-resolved check needs a lookup before it.
fn lookup_order(operation_id: &str, evidence: &MethodEvidence) -> Option<ContractMismatch> {
    let check_index = evidence.first_check_index()?;
    let check_line = match &evidence.events[check_index] {
        Evidence::Check(site) => site.line,
        _ => return None,
    };
    let lookup_before = evidence.events[..check_index]
        .iter()
        .any(|e| matches!(e, Evidence::Lookup { .. }));
    if lookup_before {
        return None;
    }
    let after = evidence.events[check_index..].iter().find_map(|e| match e {
        Evidence::Lookup { method, line } => Some((method.clone(), *line)),
        _ => None,
    });
    Some(match after {
        Some((lookup, lookup_line)) => ContractMismatch::LookupAfterCheck {
            operation_id: operation_id.to_string(),
            lookup,
            lookup_line,
            check_line,
        },
        None => ContractMismatch::MissingLookup {
            operation_id: operation_id.to_string(),
            line: check_line,
        },
    })
}

/// Run the contract diff and the audit rule over a workspace.
///
/// Handler files are resolved against `root`; the audit rule scans every
/// `.rs` file under `root/services_dir`.
pub fn verify_workspace(
    root: &Path,
    registry: &ContractRegistry,
    manifest: &HandlerManifest,
    services_dir: &Path,
) -> Result<VerificationReport, VerifyError> {
    let mut report = VerificationReport::default();
    let mut parsed: HashMap<PathBuf, Vec<MethodEvidence>> = HashMap::new();

    for entry in registry.iter() {
        let Some(binding) = manifest.get(&entry.operation_id) else {
            report.findings.push(ContractMismatch::MissingHandler {
                operation_id: entry.operation_id.clone(),
            });
            continue;
        };
        let path = root.join(&binding.file);
        if !parsed.contains_key(&path) {
            let methods = inspect_file(&path)?;
            parsed.insert(path.clone(), methods);
        }
        let methods = parsed.get(&path).map(Vec::as_slice).unwrap_or_default();
        let Some(evidence) = methods
            .iter()
            .find(|m| m.receiver == binding.receiver && m.method == binding.method)
        else {
            report.findings.push(ContractMismatch::MissingMethod {
                operation_id: entry.operation_id.clone(),
                method: binding.qualified_method(),
                file: binding.file.display().to_string(),
            });
            continue;
        };
        let findings = verify_method(entry, evidence);
        debug!(
            operation = %entry.operation_id,
            contract = %entry.contract,
            findings = findings.len(),
            "contract compared"
        );
        report.findings.extend(findings);
        report.operations_checked += 1;
    }

    for binding in manifest.iter() {
        if registry.get(&binding.operation_id).is_none() {
            report.findings.push(ContractMismatch::MissingContract {
                operation_id: binding.operation_id.clone(),
            });
        }
    }

    let services = root.join(services_dir);
    let mut scanned = Vec::new();
    for file in rust_files(&services)? {
        let methods = inspect_file(&file)?;
        let relative = file.strip_prefix(root).unwrap_or(file.as_path()).display().to_string();
        scanned.extend(methods.into_iter().map(|m| (relative.clone(), m)));
    }
    report.methods_scanned = scanned.len();
    report.findings.extend(audit_rule::check(&scanned));

    if report.is_clean() {
        info!(
            operations = report.operations_checked,
            methods = report.methods_scanned,
            "authorization contracts verified"
        );
    } else {
        warn!(findings = report.findings.len(), "authorization contract drift");
    }
    Ok(report)
}

fn inspect_file(path: &Path) -> Result<Vec<MethodEvidence>, VerifyError> {
    let source = std::fs::read_to_string(path).map_err(|source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    inspect_source(&source).map_err(|e| VerifyError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn rust_files(dir: &Path) -> Result<Vec<PathBuf>, VerifyError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| VerifyError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "rs") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn entry(operation_id: &str) -> ContractEntry {
        ContractRegistry::builtin()
            .unwrap()
            .get(operation_id)
            .unwrap()
            .clone()
    }

    fn method(source: &str) -> MethodEvidence {
        inspect_source(source).unwrap().remove(0)
    }

    #[test]
    fn matching_handler_is_clean() {
        let evidence = method(
            r#"
            impl CatalogService {
                async fn create_schema(&self, ctx: &RequestContext, req: CreateSchema) {
                    self.audit.mutation(ctx, ops::CREATE_SCHEMA, t, async {
                        self.authz.require_privilege(
                            ctx,
                            ops::CREATE_SCHEMA,
                            SecurableRef::catalog_param(&req.catalog_name),
                            Privilege::CreateSchema,
                        ).await?;
                    }).await
                }
            }
            "#,
        );
        assert!(verify_method(&entry("createSchema"), &evidence).is_empty());
    }

    #[test]
    fn wrong_privilege_is_reported() {
        let evidence = method(
            r#"
            impl CatalogService {
                async fn create_schema(&self, ctx: &RequestContext) {
                    self.authz.require_privilege(
                        ctx, op, SecurableRef::catalog_param(&c), Privilege::Modify,
                    ).await?;
                }
            }
            "#,
        );
        let findings = verify_method(&entry("createSchema"), &evidence);
        assert_eq!(findings.len(), 1);
        assert_matches!(
            &findings[0],
            ContractMismatch::PrivilegeDrift { expected: Privilege::CreateSchema, found: Found::Value(found), .. }
                if found == "MODIFY"
        );
    }

    #[test]
    fn sentinel_where_a_param_is_declared_is_source_drift() {
        let evidence = method(
            r#"
            impl CatalogService {
                async fn create_schema(&self, ctx: &RequestContext) {
                    self.authz.require_privilege(
                        ctx, op, SecurableRef::catalog_sentinel(&c), Privilege::CreateSchema,
                    ).await?;
                }
            }
            "#,
        );
        let findings = verify_method(&entry("createSchema"), &evidence);
        assert_matches!(
            findings.as_slice(),
            [ContractMismatch::SourceDrift { expected: SecurableIdSource::CatalogNameParam, .. }]
        );
    }

    #[test]
    fn lookup_after_check_is_reported() {
        let evidence = method(
            r#"
            impl CatalogService {
                async fn delete_table(&self, ctx: &RequestContext) {
                    self.authz.require_privilege(
                        ctx, op, SecurableRef::resolved(SecurableKind::Table, &id, &name), Privilege::Manage,
                    ).await?;
                    let table = self.store.get_table(c, s, t)?;
                }
            }
            "#,
        );
        let findings = verify_method(&entry("deleteTable"), &evidence);
        assert_matches!(
            findings.as_slice(),
            [ContractMismatch::LookupAfterCheck { lookup, .. }] if lookup == "get_table"
        );
    }

    #[test]
    fn runtime_resolved_without_lookup_is_reported() {
        let evidence = method(
            r#"
            impl CatalogService {
                async fn delete_table(&self, ctx: &RequestContext) {
                    self.authz.require_privilege(
                        ctx, op, SecurableRef::resolved(SecurableKind::Table, &id, &name), Privilege::Manage,
                    ).await?;
                }
            }
            "#,
        );
        assert_matches!(
            verify_method(&entry("deleteTable"), &evidence).as_slice(),
            [ContractMismatch::MissingLookup { .. }]
        );
    }

    #[test]
    fn privilege_check_in_admin_only_is_reported() {
        let evidence = method(
            r#"
            impl GrantService {
                async fn grant(&self, ctx: &RequestContext) {
                    self.authz.require_admin(ctx, op, SecurableRef::unresolved(k, n)).await?;
                    self.authz.require_privilege(
                        ctx, op, SecurableRef::catalog_param(&c), Privilege::Manage,
                    ).await?;
                }
            }
            "#,
        );
        assert_matches!(
            verify_method(&entry("createGrant"), &evidence).as_slice(),
            [ContractMismatch::PrivilegeCheckInAdminOnly { .. }]
        );
    }

    #[test]
    fn owner_mode_downgraded_to_plain_privilege_is_mode_drift() {
        let evidence = method(
            r#"
            impl CatalogService {
                async fn update_catalog(&self, ctx: &RequestContext, name: &str) {
                    self.authz.require_privilege(
                        ctx, op, SecurableRef::catalog_param(name), Privilege::Modify,
                    ).await?;
                }
            }
            "#,
        );
        assert_matches!(
            verify_method(&entry("updateCatalog"), &evidence).as_slice(),
            [ContractMismatch::ModeDrift { expected: AuthzMode::OwnerOrPrivilege, found: AuthzMode::Privilege, .. }]
        );
    }

    #[test]
    fn no_check_at_all_is_reported() {
        let evidence = method(
            r#"
            impl CatalogService {
                async fn delete_view(&self, ctx: &RequestContext) {
                    let view = self.store.get_view(c, s, v)?;
                }
            }
            "#,
        );
        assert_matches!(
            verify_method(&entry("deleteView"), &evidence).as_slice(),
            [ContractMismatch::MissingCheck { expected: AuthzMode::Privilege, .. }]
        );
    }

    #[test]
    fn findings_serialize_with_their_kind() {
        let finding = ContractMismatch::MissingHandler {
            operation_id: "createTable".into(),
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "missing_handler");
        assert_eq!(json["operation_id"], "createTable");
    }
}
