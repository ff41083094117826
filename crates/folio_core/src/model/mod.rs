//! Singleton record domain model.
//!
//! # Responsibility
//! - Define the backend-neutral row shape shared by storage adapters.
//! - Define the three configuration-like records that live as one row each.
//!
//! # Invariants
//! - Each singleton table holds at most one row, keyed by `SINGLETON_ROW_ID`.
//! - Attachment references are never taken from client payloads; they are
//!   resolved by the attachment lifecycle.

pub mod about;
pub mod field;
pub mod lenient;
pub mod notification;
pub mod personal;
pub mod singleton;
pub mod validation;
