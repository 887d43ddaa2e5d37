//! Storage trait definitions for the domain layer.
//!
//! Traits define the contract; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! with `mockall` for unit tests.
//!
//! - [`LinkStore`] - Slug-keyed link records with atomic claims and hit counters

pub mod link_store;

pub use link_store::{LinkStore, StoreStats};

#[cfg(test)]
pub use link_store::MockLinkStore;
