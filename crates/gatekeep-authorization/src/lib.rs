//! # Gatekeep Authorization - Layer 3: Check Routine
//!
//! Decides whether a principal may exercise a privilege on a securable, and
//! writes the denial audit record before any refusal leaves this crate.
//!
//! Enforcement entry points used by service methods:
//! - [`Authorizer::require_privilege`]: sentinel, direct-parameter and
//!   runtime-resolved checks (the [`SecurableRef`](gatekeep_core::SecurableRef)
//!   carries which one)
//! - [`Authorizer::require_owner_or_privilege`]: owner bypass, privilege fallback
//! - [`Authorizer::require_admin`]: grant administration
//!
//! [`Authorizer::has_privilege`] is the raw decision with no audit side effect;
//! a caller that refuses on its answer must call
//! [`AuditLog::record_denial`](gatekeep_audit::AuditLog::record_denial) itself.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authorizer;
pub mod decision;

pub use authorizer::Authorizer;
pub use decision::{AllowReason, AuthzDecision};
