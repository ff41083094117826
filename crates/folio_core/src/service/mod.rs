//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and file-store calls into use-case level APIs.
//! - Keep API/CLI layers decoupled from storage details.

pub mod singleton_service;
