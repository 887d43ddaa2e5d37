//! HTTP request extraction and observability middleware.

pub mod owner;
pub mod tracing;

pub use owner::OwnerId;
