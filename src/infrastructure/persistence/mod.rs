//! Link store implementations.
//!
//! - [`PgLinkStore`] - PostgreSQL, durable; uniqueness enforced by a table constraint
//! - [`MemoryLinkStore`] - In-process maps behind a single lock; for development and tests

pub mod memory_link_store;
pub mod pg_link_store;

pub use memory_link_store::MemoryLinkStore;
pub use pg_link_store::PgLinkStore;
