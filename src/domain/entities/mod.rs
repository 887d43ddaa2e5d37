//! Core domain entities.
//!
//! - [`LinkRecord`] - A live slug → URL mapping with its hit counter
//! - [`NewLink`] - Input for inserting a record
//! - [`LinkPatch`] - Atomic metadata change (rename and/or retarget)

pub mod link;

pub use link::{LinkPatch, LinkRecord, NewLink};
