//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - Resolution cache (Redis and no-op implementations)
//! - [`persistence`] - Link store backends (PostgreSQL and in-memory)

pub mod cache;
pub mod persistence;
