//! Attachment lifecycle: upload validation, stored-file naming, and cleanup
//! of files that lose their last reference.
//!
//! # Responsibility
//! - Gate uploads with a size ceiling and type allow-lists.
//! - Make file deletion a consequence of reference loss.
//!
//! # Invariants
//! - At most one stored file is referenced per attachment slot.
//! - A file is deleted only after the metadata write that drops its
//!   reference has committed; delete failures never fail the write.

pub mod file_store;
pub mod lifecycle;
pub mod naming;
pub mod policy;

pub use file_store::{DiskFileStore, FileStore, FileStoreError, FileStoreResult};
pub use lifecycle::{AttachmentChange, AttachmentLifecycle, AttachmentSlot, SlotTransition};
pub use naming::generate_stored_name;
pub use policy::{AttachmentPolicy, IncomingFile, DEFAULT_MAX_UPLOAD_BYTES};
