//! End-to-end: audit log over the background writer.

#![allow(clippy::unwrap_used)]

use gatekeep_audit::{
    AuditFilter, AuditKind, AuditLog, AuditOutcome, AuditRecord, AuditSink, AuditedError,
    ChannelAuditSink, MemoryAuditSink,
};
use gatekeep_core::{AuditError, Denial, Principal, Privilege, RequestContext, SecurableRef};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct OpError(String);

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AuditError> for OpError {
    fn from(e: AuditError) -> Self {
        OpError(e.to_string())
    }
}

impl AuditedError for OpError {}

struct FailingSink;

#[async_trait::async_trait]
impl AuditSink for FailingSink {
    async fn append(&self, _record: AuditRecord) -> Result<(), AuditError> {
        Err(AuditError::write("disk full"))
    }
}

#[tokio::test]
async fn records_reach_inner_sink_in_order() {
    let inner = Arc::new(MemoryAuditSink::new());
    let (channel, handle) = ChannelAuditSink::spawn(inner.clone());
    let log = AuditLog::new(Arc::new(channel)).with_tracing_mirror(false);
    let ctx = RequestContext::new(Principal::user("alice"));

    let denial = Denial::missing_privilege(
        "alice",
        SecurableRef::catalog_param("sales"),
        Privilege::CreateSchema,
    );
    log.record_denial(&ctx, "createSchema", &denial).await.unwrap();
    let _: Result<(), OpError> = log
        .mutation(&ctx, "createSchema", "catalog:sales", async {
            Err(OpError("denied".into()))
        })
        .await;
    log.flush().await.unwrap();

    let records = inner.query(&AuditFilter::new().operation("createSchema"));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, AuditKind::Denial);
    assert_eq!(records[1].kind, AuditKind::Mutation);
    assert_eq!(records[1].outcome, AuditOutcome::Failure);
    assert!(records.iter().all(|r| r.request_id == ctx.request_id()));

    drop(log);
    handle.await.unwrap();
}

#[tokio::test]
async fn lost_record_fails_successful_mutation() {
    let log = AuditLog::new(Arc::new(FailingSink)).with_tracing_mirror(false);
    let ctx = RequestContext::new(Principal::user("alice"));

    let result: Result<u8, OpError> = log
        .mutation(&ctx, "createCatalog", "catalog:sales", async { Ok(1) })
        .await;
    assert_eq!(result.unwrap_err().0, "Audit write failed: disk full");
}

#[tokio::test]
async fn operation_error_wins_when_both_fail() {
    let log = AuditLog::new(Arc::new(FailingSink)).with_tracing_mirror(false);
    let ctx = RequestContext::new(Principal::user("alice"));

    let result: Result<u8, OpError> = log
        .mutation(&ctx, "deleteCatalog", "catalog:sales", async {
            Err(OpError("catalog not found".into()))
        })
        .await;
    assert_eq!(result.unwrap_err().0, "catalog not found");
}
