//! Core business logic for Pennywise.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Domain types, the persistence ports, and the services that enforce
//! ownership scoping all live here.
//!
//! # Modules
//!
//! - `resource` - Generic owner-scoped CRUD over any [`resource::Resource`]
//! - `store` - Persistence ports implemented by `pennywise-db` (and `memory`)
//! - `auth` - Credential hashing and the authentication service
//! - `user` - Profiles and administrator user management
//! - `budget`, `expense`, `notification` - The owned resources
//! - `export` - Per-user CSV report
//! - `clock` - Injectable time source

pub mod auth;
pub mod budget;
pub mod clock;
pub mod expense;
pub mod export;
pub mod notification;
pub mod resource;
pub mod store;
pub mod user;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use clock::{Clock, SystemClock};
pub use resource::{Caller, Resource, Scope, ScopedService};
pub use store::{ResourceStore, StoreError, StoreResult, UserStore};
