//! Core of the portfolio admin backend.
//!
//! Owns the singleton configuration records (personal details, about
//! summary, notification settings), their single-row persistence, and the
//! lifecycle of files attached to them.

pub mod api;
pub mod attachment;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{
    get_singleton, guarded, post_singleton, ApiResponse, FormSubmission, SessionGate,
    SingletonRequest,
};
pub use attachment::{
    AttachmentChange, AttachmentLifecycle, AttachmentPolicy, AttachmentSlot, DiskFileStore,
    FileStore, FileStoreError, IncomingFile,
};
pub use config::{ConfigError, FolioConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::about::AboutSummary;
pub use model::field::{FieldSet, FieldValue, StoredRow};
pub use model::notification::{NotificationChannel, NotificationSettings};
pub use model::personal::PersonalDetails;
pub use model::singleton::{SingletonKind, SingletonRecord, TableSpec, SINGLETON_ROW_ID};
pub use model::validation::ValidationError;
pub use repo::singleton_repo::{RecordBackend, SqliteRecordBackend, StoreError, StoreResult};
pub use service::singleton_service::{SingleRecordStore, UpsertError, UpsertOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
