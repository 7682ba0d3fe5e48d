//! # Gatekeep Audit - Layer 2: Audit Logger
//!
//! Process-wide, append-only record of every mutating call attempt and every
//! authorization denial.
//!
//! Two independent obligations:
//! - **Mutation audit**: [`AuditLog::mutation`] wraps a state-changing service
//!   method and emits exactly one record per invocation, success or failure.
//!   Methods audited elsewhere are listed in [`AUDIT_EXEMPTIONS`].
//! - **Denial audit**: [`AuditLog::record_denial`] is called by the check
//!   routine on every refusal, before the error is returned.
//!
//! Records never feed back into authorization decisions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod exemptions;
pub mod log;
pub mod record;
pub mod sink;

pub use exemptions::{exemption_for, AuditExemption, AUDIT_EXEMPTIONS};
pub use log::{AuditLog, AuditedError};
pub use record::{AuditFilter, AuditKind, AuditOutcome, AuditRecord};
pub use sink::{AuditSink, ChannelAuditSink, MemoryAuditSink};
