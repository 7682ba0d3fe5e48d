//! # Gatekeep Catalog - Layer 4: Guarded Catalog Services
//!
//! Hierarchical metadata (catalogs, schemas, tables, views, volumes, storage
//! credentials, external locations, compute endpoints) and the service methods
//! that mutate it. Every mutating method:
//!
//! 1. runs inside the mutation audit wrapper,
//! 2. resolves the target's durable id when the target already exists,
//! 3. enforces through the check routine before touching the store.
//!
//! Which check each method performs is declared separately in the contract
//! registry and verified against these sources by `gatekeep-contract`.

#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod ops;
pub mod platform;
pub mod service;
pub mod store;

pub use error::{CatalogError, CatalogResult};
pub use model::*;
pub use platform::Platform;
pub use service::{CatalogService, ComputeService, GrantService, StorageService};
pub use store::MetadataStore;
