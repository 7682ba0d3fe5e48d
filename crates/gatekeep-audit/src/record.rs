//! Audit record schema.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Which obligation produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// One per mutating service call
    Mutation,
    /// One per authorization denial
    Denial,
    /// Engine-level events (startup reconciliation)
    System,
}

/// Outcome marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Completed
    Success,
    /// Failed for a reason other than authorization
    Failure,
    /// Refused by the check routine
    Denied,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
            AuditOutcome::Denied => "denied",
        })
    }
}

/// Immutable audit record: who tried to do what, to which object, and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Emission order within the process
    pub seq: u64,
    /// Correlates records of one request
    pub request_id: Uuid,
    /// Producing obligation
    pub kind: AuditKind,
    /// Principal name
    pub actor: String,
    /// Operation id (`createSchema`)
    pub operation: String,
    /// Target securable (`catalog:sales`)
    pub target: String,
    /// Outcome
    pub outcome: AuditOutcome,
    /// Error or denial message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Emission time
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Filter for reading records back.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    actor: Option<String>,
    operation: Option<String>,
    kind: Option<AuditKind>,
}

impl AuditFilter {
    /// Match everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only records by this actor.
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Only records for this operation.
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Only records of this kind.
    pub fn kind(mut self, kind: AuditKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Whether a record passes the filter.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.actor.as_deref().map_or(true, |a| a == record.actor)
            && self
                .operation
                .as_deref()
                .map_or(true, |o| o == record.operation)
            && self.kind.map_or(true, |k| k == record.kind)
    }
}
