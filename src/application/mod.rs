//! Application layer services implementing business logic.
//!
//! Services validate input, apply ownership rules and coordinate the store
//! with the resolution cache. HTTP handlers and the admin CLI call into this
//! layer and never touch the store directly.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, rename, update and deletion
//! - [`services::redirect_resolver::RedirectResolver`] - Public slug resolution and hit queueing

pub mod services;
