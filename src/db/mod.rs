//! Local persisted state: the contact-submission queue and the session row.
//!
//! - `model`: rows returned by repositories.
//! - `repo`: SQL-only functions that map rows into those types.
//!
//! Callers import from `furnish_content::db` directly.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::QueuedSubmission;
