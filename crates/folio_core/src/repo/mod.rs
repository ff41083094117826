//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage capability contract singleton services run against.
//! - Isolate SQLite query details from service orchestration.

pub mod singleton_repo;
