//! Pure helpers shared across layers.
//!
//! - [`slug`] - Slug normalization, validation and generation
//! - [`url_normalizer`] - Target URL validation and canonicalization

pub mod slug;
pub mod url_normalizer;
