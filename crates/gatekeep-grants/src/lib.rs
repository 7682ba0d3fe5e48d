//! # Gatekeep Grants - Layer 2: Grant Store
//!
//! Holds `(principal, securable kind, securable id, privilege)` facts and a
//! per-principal admin flag, and answers membership queries.
//!
//! - Grants are additive; absence means "not granted"
//! - "Not granted" is a `false` answer, never an error
//! - Only infrastructure failures surface as
//!   [`AuthzError::StoreUnavailable`](gatekeep_core::AuthzError::StoreUnavailable)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod memory;
pub mod store;

pub use memory::{GrantSnapshot, InMemoryGrantStore};
pub use store::{Grant, GrantStore};
