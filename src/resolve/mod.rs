// src/resolve/mod.rs

//! Dependency resolution and invalidation planning.
//!
//! - [`resolver`] walks the runtime link graph backwards from a changed unit
//!   to find every unit that (transitively) linked against it.
//! - [`namespace`] decides which units can never be dependents (host
//!   built-ins, vendored packages).
//! - [`plan`] turns a resolution into an ordered eviction and carries the
//!   outcome.

pub mod namespace;
pub mod plan;
pub mod resolver;

pub use namespace::NamespaceFilter;
pub use plan::{EvictionReport, InvalidationResult};
pub use resolver::{resolve_dependents, DependencyResolver};
