//! Domain layer containing business entities and storage contracts.
//!
//! - [`entities`] - Link records and the inputs that create or change them
//! - [`repositories`] - The [`repositories::LinkStore`] trait
//! - [`hit_event`] - Hit event model
//! - [`hit_worker`] - Asynchronous hit counting
//!
//! # Hit Counting Flow
//!
//! 1. The redirect resolver finds the target URL
//! 2. A [`hit_event::HitEvent`] is queued via [`hit_worker::HitRecorder`] (non-blocking)
//! 3. [`hit_worker::run_hit_worker`] applies the increment with retry
//! 4. The counter lands through [`repositories::LinkStore::increment_hit`]

pub mod entities;
pub mod hit_event;
pub mod hit_worker;
pub mod repositories;
