//! Audit log: sequencing, tracing mirror, and the mutation wrapper.

use crate::record::{AuditKind, AuditOutcome, AuditRecord};
use crate::sink::AuditSink;
use gatekeep_core::{AuditError, Denial, RequestContext};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Errors returned by audited service methods.
///
/// The wrapper needs to classify the failure and to surface an audit write
/// failure through the method's own error type.
pub trait AuditedError: Display + From<AuditError> {
    /// Outcome recorded when the method fails with this error.
    fn audit_outcome(&self) -> AuditOutcome {
        AuditOutcome::Failure
    }
}

/// Process-wide audit log.
pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
    seq: AtomicU64,
    mirror_to_tracing: bool,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("seq", &self.seq.load(Ordering::Relaxed))
            .field("mirror_to_tracing", &self.mirror_to_tracing)
            .finish()
    }
}

impl AuditLog {
    /// Audit log writing to `sink`.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            seq: AtomicU64::new(0),
            mirror_to_tracing: true,
        }
    }

    /// Toggle mirroring records to `tracing`.
    pub fn with_tracing_mirror(mut self, enabled: bool) -> Self {
        self.mirror_to_tracing = enabled;
        self
    }

    /// Record an authorization denial.
    pub async fn record_denial(
        &self,
        ctx: &RequestContext,
        operation: &str,
        denial: &Denial,
    ) -> Result<(), AuditError> {
        self.emit(
            ctx.request_id(),
            AuditKind::Denial,
            &ctx.principal().name,
            operation,
            denial.securable.to_string(),
            AuditOutcome::Denied,
            Some(denial.to_string()),
        )
        .await
    }

    /// Record a denial issued in place of a not-found answer.
    ///
    /// The caller saw an ordinary refusal; the record keeps the qualified
    /// name that was requested and notes that it did not resolve.
    pub async fn record_concealed_denial(
        &self,
        ctx: &RequestContext,
        operation: &str,
        denial: &Denial,
    ) -> Result<(), AuditError> {
        let securable = &denial.securable;
        self.emit(
            ctx.request_id(),
            AuditKind::Denial,
            &ctx.principal().name,
            operation,
            format!("{}:{}", securable.kind(), securable.grant_id()),
            AuditOutcome::Denied,
            Some(format!("{denial}; target not found, existence concealed")),
        )
        .await
    }

    /// Run a mutating operation and emit exactly one mutation record for it.
    ///
    /// The record is written whatever the outcome. If the operation succeeded
    /// but its record cannot be written, the call fails with the audit error;
    /// if both failed, the operation's own error wins.
    pub async fn mutation<T, E, F>(
        &self,
        ctx: &RequestContext,
        operation: &str,
        target: impl Display,
        op: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: AuditedError,
    {
        let target = target.to_string();
        let result = op.await;
        let (outcome, detail) = match &result {
            Ok(_) => (AuditOutcome::Success, None),
            Err(e) => (e.audit_outcome(), Some(e.to_string())),
        };

        let written = self
            .emit(
                ctx.request_id(),
                AuditKind::Mutation,
                &ctx.principal().name,
                operation,
                target,
                outcome,
                detail,
            )
            .await;

        match (result, written) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(audit)) => Err(E::from(audit)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(audit)) => {
                error!(operation, error = %audit, "mutation audit record lost after failed operation");
                Err(e)
            }
        }
    }

    /// Record an engine-level event (startup reconciliation and the like).
    pub async fn system_event(
        &self,
        operation: &str,
        target: impl Display,
        detail: Option<String>,
    ) -> Result<(), AuditError> {
        self.emit(
            Uuid::nil(),
            AuditKind::System,
            "system",
            operation,
            target.to_string(),
            AuditOutcome::Success,
            detail,
        )
        .await
    }

    /// Wait for the sink to persist everything appended so far.
    pub async fn flush(&self) -> Result<(), AuditError> {
        self.sink.flush().await
    }

    async fn emit(
        &self,
        request_id: Uuid,
        kind: AuditKind,
        actor: &str,
        operation: &str,
        target: String,
        outcome: AuditOutcome,
        detail: Option<String>,
    ) -> Result<(), AuditError> {
        let record = AuditRecord {
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            request_id,
            kind,
            actor: actor.to_string(),
            operation: operation.to_string(),
            target,
            outcome,
            detail,
            timestamp: OffsetDateTime::now_utc(),
        };

        if self.mirror_to_tracing {
            match kind {
                AuditKind::Denial => warn!(
                    actor = %record.actor,
                    operation = %record.operation,
                    target = %record.target,
                    "audit: access denied"
                ),
                AuditKind::Mutation | AuditKind::System => info!(
                    actor = %record.actor,
                    operation = %record.operation,
                    target = %record.target,
                    outcome = %record.outcome,
                    "audit: mutation"
                ),
            }
        }

        self.sink.append(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryAuditSink;
    use gatekeep_core::{Principal, Privilege, SecurableKind, SecurableRef};

    #[derive(Debug)]
    enum TestError {
        Denied,
        Broken,
        Audit(AuditError),
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Denied => f.write_str("denied"),
                TestError::Broken => f.write_str("broken"),
                TestError::Audit(e) => write!(f, "{e}"),
            }
        }
    }

    impl From<AuditError> for TestError {
        fn from(e: AuditError) -> Self {
            TestError::Audit(e)
        }
    }

    impl AuditedError for TestError {
        fn audit_outcome(&self) -> AuditOutcome {
            match self {
                TestError::Denied => AuditOutcome::Denied,
                _ => AuditOutcome::Failure,
            }
        }
    }

    fn log() -> (AuditLog, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (AuditLog::new(sink.clone()).with_tracing_mirror(false), sink)
    }

    #[tokio::test]
    async fn mutation_records_success_once() {
        let (log, sink) = log();
        let ctx = RequestContext::new(Principal::user("alice"));
        let value: Result<u32, TestError> = log
            .mutation(&ctx, "createSchema", "catalog:sales", async { Ok(7) })
            .await;
        assert_eq!(value.ok(), Some(7));

        let records = sink.mutations();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].actor, "alice");
        assert_eq!(records[0].target, "catalog:sales");
        assert_eq!(records[0].outcome, AuditOutcome::Success);
        assert_eq!(records[0].request_id, ctx.request_id());
    }

    #[tokio::test]
    async fn mutation_records_failures_with_classification() {
        let (log, sink) = log();
        let ctx = RequestContext::new(Principal::user("alice"));
        let _: Result<(), TestError> = log
            .mutation(&ctx, "deleteTable", "table:sales.orders.events", async {
                Err(TestError::Denied)
            })
            .await;
        let _: Result<(), TestError> = log
            .mutation(&ctx, "deleteTable", "table:sales.orders.events", async {
                Err(TestError::Broken)
            })
            .await;

        let outcomes: Vec<_> = sink.mutations().iter().map(|r| r.outcome).collect();
        assert_eq!(outcomes, vec![AuditOutcome::Denied, AuditOutcome::Failure]);
        assert_eq!(sink.mutations()[1].detail.as_deref(), Some("broken"));
    }

    #[tokio::test]
    async fn denial_record_carries_structured_target() {
        let (log, sink) = log();
        let ctx = RequestContext::new(Principal::user("alice"));
        let denial = Denial::missing_privilege(
            "alice",
            SecurableRef::catalog_param("sales"),
            Privilege::CreateSchema,
        );
        log.record_denial(&ctx, "createSchema", &denial).await.unwrap();

        let denials = sink.denials();
        assert_eq!(denials.len(), 1);
        assert_eq!(denials[0].target, "catalog:sales");
        assert_eq!(denials[0].outcome, AuditOutcome::Denied);
    }

    #[tokio::test]
    async fn concealed_denial_keeps_the_requested_name() {
        let (log, sink) = log();
        let ctx = RequestContext::new(Principal::user("alice"));
        let denial = Denial::missing_privilege(
            "alice",
            SecurableRef::unresolved(SecurableKind::Table, "sales.orders.ghost").with_label("ghost"),
            Privilege::Modify,
        );
        log.record_concealed_denial(&ctx, "updateTable", &denial)
            .await
            .unwrap();

        let denials = sink.denials();
        assert_eq!(denials.len(), 1);
        assert_eq!(denials[0].target, "table:sales.orders.ghost");
        assert_eq!(
            denials[0].detail.as_deref(),
            Some("alice lacks MODIFY on table:ghost; target not found, existence concealed")
        );
    }

    #[tokio::test]
    async fn sequence_numbers_follow_emission_order() {
        let (log, sink) = log();
        for _ in 0..3 {
            log.system_event("attachCatalog", "catalog:main", None)
                .await
                .unwrap();
        }
        let seqs: Vec<u64> = sink.records().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
