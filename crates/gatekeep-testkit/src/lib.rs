//! Gatekeep Testing Infrastructure
//!
//! Shared fixtures for the Gatekeep crates: named principals, grant stores
//! and audit sinks that fail on demand, and a pre-wired platform with a
//! `sales.orders.events` table in place.

//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! gatekeep-testkit = { path = "../gatekeep-testkit" }
//! ```
//!
//! ```rust,no_run
//! use gatekeep_testkit::*;
//!
//! # async fn demo() {
//! let world = TestPlatform::sales().await;
//! let err = world
//!     .platform
//!     .catalogs
//!     .delete_table(&alice(), "sales.orders.events")
//!     .await
//!     .unwrap_err();
//! assert_denied!(err);
//! # }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod assertions;
pub mod mocks;
pub mod platform;
pub mod principals;

pub use mocks::*;
pub use platform::*;
pub use principals::*;

#[doc(hidden)]
pub use gatekeep_audit as __audit;
