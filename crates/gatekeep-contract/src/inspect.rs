//! Source inspection.
//!
//! Parses a service source file and records, per method and in source order,
//! the calls that matter to enforcement: store lookups, check routine calls
//! with their literal securable and privilege arguments, raw decisions,
//! denial audits and the mutation-audit wrapper.

use gatekeep_core::{AuthzMode, Privilege, SecurableIdSource, SecurableKind};
use syn::visit::Visit;
use syn::{Expr, ExprCall, ExprMethodCall, FnArg, ImplItem, ImplItemFn, ItemImpl, ItemMod, Type};

/// How a check call site built its securable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurableEvidence {
    /// `SecurableRef` constructor (`resolved`, `catalog_param`, ...)
    pub constructor: String,
    /// Kind, when the constructor fixes one or names it literally
    pub kind: Option<SecurableKind>,
    /// Id source the constructor implies; `None` for `unresolved`
    pub source: Option<SecurableIdSource>,
}

/// One call into the check routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSite {
    /// Mode implied by the routine entry point
    pub mode: AuthzMode,
    /// Literal securable argument, if it was built inline
    pub securable: Option<SecurableEvidence>,
    /// Literal `Privilege::*` argument
    pub privilege: Option<Privilege>,
    /// Source line
    pub line: usize,
}

/// Enforcement-relevant call, in the order it appears in the method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// `get_*` metadata lookup
    Lookup {
        /// Called method
        method: String,
        /// Source line
        line: usize,
    },
    /// `require_privilege`, `require_owner_or_privilege` or `require_admin`
    Check(CheckSite),
    /// `has_privilege`: a decision that does not audit its own denial
    RawCheck {
        /// Source line
        line: usize,
    },
    /// `record_denial` or `record_concealed_denial`
    DenialAudit {
        /// Source line
        line: usize,
    },
    /// `mutation`: the audit wrapper
    MutationAudit {
        /// Source line
        line: usize,
    },
}

/// Everything observed in one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEvidence {
    /// Implementing type
    pub receiver: String,
    /// Method name
    pub method: String,
    /// Whether a `&RequestContext` parameter is taken
    pub takes_context: bool,
    /// Line of the method name
    pub line: usize,
    /// Calls in source order
    pub events: Vec<Evidence>,
}

impl MethodEvidence {
    /// `Type::method`
    pub fn qualified(&self) -> String {
        format!("{}::{}", self.receiver, self.method)
    }

    /// Check routine calls.
    pub fn checks(&self) -> impl Iterator<Item = &CheckSite> {
        self.events.iter().filter_map(|event| match event {
            Evidence::Check(site) => Some(site),
            _ => None,
        })
    }

    /// Position of the first check routine call in `events`.
    pub fn first_check_index(&self) -> Option<usize> {
        self.events
            .iter()
            .position(|event| matches!(event, Evidence::Check(_)))
    }

    pub fn has_mutation_audit(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, Evidence::MutationAudit { .. }))
    }

    pub fn has_denial_audit(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, Evidence::DenialAudit { .. }))
    }

    pub fn raw_check_line(&self) -> Option<usize> {
        self.events.iter().find_map(|event| match event {
            Evidence::RawCheck { line } => Some(*line),
            _ => None,
        })
    }
}

/// Inspect every inherent and trait method in `source`.
///
/// `#[cfg(test)]` modules are skipped.
pub fn inspect_source(source: &str) -> Result<Vec<MethodEvidence>, syn::Error> {
    let file = syn::parse_file(source)?;
    let mut visitor = FileVisitor::default();
    visitor.visit_file(&file);
    Ok(visitor.methods)
}

#[derive(Default)]
struct FileVisitor {
    methods: Vec<MethodEvidence>,
}

impl<'ast> Visit<'ast> for FileVisitor {
    fn visit_item_mod(&mut self, node: &'ast ItemMod) {
        if has_cfg_test(&node.attrs) {
            return;
        }
        syn::visit::visit_item_mod(self, node);
    }

    fn visit_item_impl(&mut self, node: &'ast ItemImpl) {
        let Some(receiver) = type_name(&node.self_ty) else {
            return;
        };
        for item in &node.items {
            if let ImplItem::Fn(function) = item {
                self.methods.push(inspect_method(&receiver, function));
            }
        }
    }
}

fn inspect_method(receiver: &str, function: &ImplItemFn) -> MethodEvidence {
    let mut body = BodyVisitor::default();
    body.visit_block(&function.block);
    MethodEvidence {
        receiver: receiver.to_string(),
        method: function.sig.ident.to_string(),
        takes_context: function.sig.inputs.iter().any(is_context_param),
        line: function.sig.ident.span().start().line,
        events: body.events,
    }
}

#[derive(Default)]
struct BodyVisitor {
    events: Vec<Evidence>,
}

impl<'ast> Visit<'ast> for BodyVisitor {
    // Receiver, then this call, then arguments: the order they are written in.
    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        self.visit_expr(&node.receiver);
        self.record(node);
        for arg in &node.args {
            self.visit_expr(arg);
        }
    }
}

impl BodyVisitor {
    fn record(&mut self, node: &ExprMethodCall) {
        let name = node.method.to_string();
        let line = node.method.span().start().line;
        let event = match name.as_str() {
            "require_privilege" => Evidence::Check(check_site(AuthzMode::Privilege, node, line)),
            "require_owner_or_privilege" => {
                Evidence::Check(check_site(AuthzMode::OwnerOrPrivilege, node, line))
            }
            "require_admin" => Evidence::Check(check_site(AuthzMode::AdminOnly, node, line)),
            "has_privilege" => Evidence::RawCheck { line },
            "record_denial" | "record_concealed_denial" => Evidence::DenialAudit { line },
            "mutation" => Evidence::MutationAudit { line },
            lookup if lookup.starts_with("get_") => Evidence::Lookup {
                method: name.clone(),
                line,
            },
            _ => return,
        };
        self.events.push(event);
    }
}

fn check_site(mode: AuthzMode, node: &ExprMethodCall, line: usize) -> CheckSite {
    CheckSite {
        mode,
        securable: node.args.iter().find_map(securable_evidence),
        privilege: node
            .args
            .iter()
            .find_map(|arg| path_tail(arg, "Privilege").and_then(|v| Privilege::from_variant_ident(&v))),
        line,
    }
}

fn securable_evidence(arg: &Expr) -> Option<SecurableEvidence> {
    let Expr::Call(call) = strip(arg) else {
        return None;
    };
    let constructor = path_tail(&call.func, "SecurableRef")?;
    let (kind, source) = match constructor.as_str() {
        "catalog_param" => (
            Some(SecurableKind::Catalog),
            Some(SecurableIdSource::CatalogNameParam),
        ),
        "catalog_sentinel" => (
            Some(SecurableKind::Catalog),
            Some(SecurableIdSource::CatalogSentinel),
        ),
        "resolved" => (
            literal_kind(call),
            Some(SecurableIdSource::RuntimeResolvedObjectId),
        ),
        "unresolved" => (literal_kind(call), None),
        _ => return None,
    };
    Some(SecurableEvidence {
        constructor,
        kind,
        source,
    })
}

fn literal_kind(call: &ExprCall) -> Option<SecurableKind> {
    let first = call.args.first()?;
    SecurableKind::from_variant_ident(&path_tail(first, "SecurableKind")?)
}

/// For `Owner::Ident` (optionally further qualified), the final ident.
fn path_tail(expr: &Expr, owner: &str) -> Option<String> {
    let Expr::Path(path) = strip(expr) else {
        return None;
    };
    let segments: Vec<_> = path.path.segments.iter().collect();
    match segments.as_slice() {
        [.., parent, last] if parent.ident == owner => Some(last.ident.to_string()),
        _ => None,
    }
}

fn strip(expr: &Expr) -> &Expr {
    match expr {
        Expr::Reference(inner) => strip(&inner.expr),
        Expr::Paren(inner) => strip(&inner.expr),
        Expr::Group(inner) => strip(&inner.expr),
        other => other,
    }
}

fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(reference) => type_name(&reference.elem),
        _ => None,
    }
}

fn is_context_param(arg: &FnArg) -> bool {
    match arg {
        FnArg::Typed(typed) => match &*typed.ty {
            Type::Reference(reference) => {
                type_name(&reference.elem).as_deref() == Some("RequestContext")
            }
            _ => false,
        },
        FnArg::Receiver(_) => false,
    }
}

fn has_cfg_test(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && matches!(attr.parse_args::<syn::Ident>(), Ok(ident) if ident == "test")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        impl TableService {
            pub async fn update_table(&self, ctx: &RequestContext, full_name: &str) -> Result<(), E> {
                self.audit.mutation(ctx, "updateTable", target, async {
                    let table = self.store.get_table(catalog, schema, name)?;
                    self.authz
                        .require_privilege(
                            ctx,
                            "updateTable",
                            SecurableRef::resolved(SecurableKind::Table, &table.id, &table.name),
                            Privilege::Modify,
                        )
                        .await?;
                    Ok(())
                }).await
            }

            fn helper(&self, name: &str) -> bool {
                self.grants.has_privilege(name)
            }
        }

        #[cfg(test)]
        mod tests {
            impl Ignored {
                fn create_thing(&self, ctx: &RequestContext) {}
            }
        }
    "#;

    #[test]
    fn events_follow_source_order() {
        let methods = inspect_source(SAMPLE).unwrap();
        assert_eq!(methods.len(), 2);

        let update = &methods[0];
        assert_eq!(update.qualified(), "TableService::update_table");
        assert!(update.takes_context);
        assert!(matches!(update.events[0], Evidence::MutationAudit { .. }));
        assert!(matches!(&update.events[1], Evidence::Lookup { method, .. } if method == "get_table"));
        assert_eq!(update.first_check_index(), Some(2));

        let site = update.checks().next().unwrap();
        assert_eq!(site.mode, AuthzMode::Privilege);
        assert_eq!(site.privilege, Some(Privilege::Modify));
        assert_eq!(
            site.securable,
            Some(SecurableEvidence {
                constructor: "resolved".into(),
                kind: Some(SecurableKind::Table),
                source: Some(SecurableIdSource::RuntimeResolvedObjectId),
            })
        );
    }

    #[test]
    fn raw_checks_are_recorded_and_test_modules_skipped() {
        let methods = inspect_source(SAMPLE).unwrap();
        let helper = &methods[1];
        assert!(!helper.takes_context);
        assert!(helper.raw_check_line().is_some());
        assert!(!helper.has_denial_audit());
        assert!(methods.iter().all(|m| m.receiver != "Ignored"));
    }

    #[test]
    fn opaque_securable_arguments_are_left_unknown() {
        let methods = inspect_source(
            r#"
            impl S {
                async fn create_schema(&self, ctx: &RequestContext) {
                    let target = SecurableRef::catalog_param("x");
                    self.authz.require_privilege(ctx, "op", target, Privilege::CreateSchema).await;
                }
            }
            "#,
        )
        .unwrap();
        let site = methods[0].checks().next().unwrap();
        assert_eq!(site.securable, None);
        assert_eq!(site.privilege, Some(Privilege::CreateSchema));
    }

    #[test]
    fn syntax_errors_surface() {
        assert!(inspect_source("impl {").is_err());
    }
}
