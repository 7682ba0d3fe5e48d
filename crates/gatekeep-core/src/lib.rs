//! # Gatekeep Core - Layer 1: Foundation
//!
//! **Purpose**: Define the vocabulary every other Gatekeep crate speaks.
//!
//! - Securable kinds and their conceptual containment hierarchy
//! - Privileges and the privilege/kind validity table
//! - Securable references that carry their identifier provenance
//! - Enforcement modes and identifier-resolution sources
//! - Principals and request context
//! - The error taxonomy shared by the check routine and its callers
//! - Engine configuration
//!
//! # Architecture Constraints
//!
//! - YES pure data and validation functions
//! - NO grant state, audit sinks or service logic (see the Layer 2+ crates)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod errors;
pub mod mode;
pub mod principal;
pub mod privilege;
pub mod securable;

pub use config::{
    AuditConfig, BootstrapConfig, ConfigError, GatekeepConfig, GrantSpec, MembershipSpec,
};
pub use errors::{AuditError, AuthzError, AuthzResult, Denial, DenialReason};
pub use mode::{AuthzMode, SecurableIdSource};
pub use principal::{Principal, RequestContext};
pub use privilege::{is_valid_privilege_for_kind, Privilege};
pub use securable::{SecurableId, SecurableKind, SecurableRef};
