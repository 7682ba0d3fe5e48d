//! # Gatekeep Contract - Layer 4: Authorization Contract Registry
//!
//! Closes the loop between what each API operation is declared to enforce and
//! what its service method actually enforces.
//!
//! - [`ContractRegistry`]: one declared [`AuthzContract`] per operation, kept
//!   as data in `contracts/authz.toml`
//! - [`HandlerManifest`]: which service method implements each operation
//! - [`inspect`]: `syn`-based evidence of the calls a method makes, in order
//! - [`verify_workspace`]: diffs the two and applies the mutation-audit rule
//!
//! Nothing here runs at request time. The `gatekeep-verify` binary and the
//! parity test in `tests/` run it against the real service sources.

#![forbid(unsafe_code)]

pub mod audit_rule;
pub mod inspect;
pub mod manifest;
pub mod registry;
pub mod verify;

pub use inspect::{inspect_source, CheckSite, Evidence, MethodEvidence, SecurableEvidence};
pub use manifest::{HandlerBinding, HandlerManifest};
pub use registry::{AuthzContract, ContractCheck, ContractEntry, ContractRegistry, RegistryError};
pub use verify::{verify_method, verify_workspace, ContractMismatch, Found, VerificationReport, VerifyError};

/// Service sources scanned by default, relative to the workspace root.
pub const DEFAULT_SERVICES_DIR: &str = "crates/gatekeep-catalog/src/service";
