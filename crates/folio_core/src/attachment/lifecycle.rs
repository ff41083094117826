//! Attachment slot state machine and reference-driven file cleanup.
//!
//! # Invariants
//! - `supersede` is called only after the owning metadata write committed.
//! - Cleanup failures are logged and swallowed: an unreferenced file is a
//!   disk-space leak, not a correctness violation.

use crate::attachment::file_store::{FileStore, FileStoreResult};
use crate::attachment::naming::generate_stored_name;
use crate::attachment::policy::{AttachmentPolicy, IncomingFile};
use crate::model::validation::ValidationError;
use log::{info, warn};

/// Requested change to an attachment slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentChange {
    /// Leave the current reference untouched.
    Keep,
    /// Store a new file and point the slot at it.
    Replace(IncomingFile),
    /// Clear the slot.
    Remove,
}

impl AttachmentChange {
    /// Builds a change from the raw request inputs.
    ///
    /// A request carrying both a file and the removal flag is rejected rather
    /// than resolved by precedence.
    pub fn from_request(file: Option<IncomingFile>, remove: bool) -> Result<Self, ValidationError> {
        match (file, remove) {
            (Some(_), true) => Err(ValidationError::ConflictingAttachmentChange),
            (Some(file), false) => Ok(Self::Replace(file)),
            (None, true) => Ok(Self::Remove),
            (None, false) => Ok(Self::Keep),
        }
    }
}

/// Slot transition after any new upload has been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTransition {
    Keep,
    Upload(String),
    Remove,
}

/// State of one attachment slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttachmentSlot {
    #[default]
    Empty,
    Present(String),
}

impl AttachmentSlot {
    pub fn from_reference(reference: Option<String>) -> Self {
        match reference {
            Some(reference) => Self::Present(reference),
            None => Self::Empty,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Present(reference) => Some(reference.as_str()),
        }
    }

    pub fn into_reference(self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Present(reference) => Some(reference),
        }
    }

    /// Applies a transition, returning the next state and the reference it
    /// retires (if any). The retired file must only be deleted once the
    /// next state has been persisted.
    pub fn apply(self, transition: SlotTransition) -> (Self, Option<String>) {
        match (self, transition) {
            (current, SlotTransition::Keep) => (current, None),
            (Self::Empty, SlotTransition::Upload(next)) => (Self::Present(next), None),
            (Self::Present(old), SlotTransition::Upload(next)) => {
                let retired = (old != next).then_some(old);
                (Self::Present(next), retired)
            }
            (Self::Empty, SlotTransition::Remove) => (Self::Empty, None),
            (Self::Present(old), SlotTransition::Remove) => (Self::Empty, Some(old)),
        }
    }
}

/// Owns upload acceptance and the delete-on-reference-loss rule for one
/// attachment slot type.
pub struct AttachmentLifecycle<F: FileStore> {
    files: F,
    policy: AttachmentPolicy,
}

impl<F: FileStore> AttachmentLifecycle<F> {
    pub fn new(files: F, policy: AttachmentPolicy) -> Self {
        Self { files, policy }
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Accepts or rejects an upload. Never touches the file store.
    pub fn validate_incoming(&self, file: &IncomingFile) -> Result<(), ValidationError> {
        self.policy.check(file)
    }

    /// Stores an accepted upload under a freshly generated name.
    pub fn store_incoming(&self, file: &IncomingFile) -> FileStoreResult<String> {
        let name = generate_stored_name(self.policy.name_prefix, &file.original_name);
        self.files.put(&name, &file.bytes)
    }

    /// Deletes `old` when it is set and no longer equals `new`.
    ///
    /// Call only after the metadata write that switched to `new` committed.
    pub fn supersede(&self, old: Option<&str>, new: Option<&str>) {
        let Some(old) = old else {
            return;
        };
        if Some(old) == new {
            return;
        }
        self.delete_best_effort(old, "superseded");
    }

    /// Removes an upload whose metadata write failed, so it never lingers
    /// unreferenced.
    pub fn discard_unreferenced(&self, reference: &str) {
        self.delete_best_effort(reference, "write_failed");
    }

    fn delete_best_effort(&self, reference: &str, reason: &str) {
        match self.files.delete(reference) {
            Ok(()) => info!(
                "event=attachment_delete module=attachment status=ok reason={} reference={}",
                reason, reference
            ),
            Err(err) => warn!(
                "event=attachment_delete module=attachment status=error reason={} reference={} error={}",
                reason, reference, err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachmentChange, AttachmentLifecycle, AttachmentSlot, SlotTransition};
    use crate::attachment::file_store::{DiskFileStore, FileStore};
    use crate::attachment::policy::{AttachmentPolicy, IncomingFile};
    use crate::model::validation::ValidationError;

    #[test]
    fn slot_transitions_follow_upload_and_remove_rules() {
        let (slot, retired) = AttachmentSlot::Empty.apply(SlotTransition::Upload("a".into()));
        assert_eq!(slot, AttachmentSlot::Present("a".into()));
        assert_eq!(retired, None);

        let (slot, retired) = slot.apply(SlotTransition::Upload("b".into()));
        assert_eq!(slot, AttachmentSlot::Present("b".into()));
        assert_eq!(retired.as_deref(), Some("a"));

        let (slot, retired) = slot.apply(SlotTransition::Keep);
        assert_eq!(slot.reference(), Some("b"));
        assert_eq!(retired, None);

        let (slot, retired) = slot.apply(SlotTransition::Remove);
        assert_eq!(slot, AttachmentSlot::Empty);
        assert_eq!(retired.as_deref(), Some("b"));

        let (slot, retired) = slot.apply(SlotTransition::Remove);
        assert_eq!(slot, AttachmentSlot::Empty);
        assert_eq!(retired, None);
    }

    #[test]
    fn file_plus_remove_flag_is_rejected() {
        let file = IncomingFile::new("a.png", vec![1]);
        assert_eq!(
            AttachmentChange::from_request(Some(file), true),
            Err(ValidationError::ConflictingAttachmentChange)
        );
        assert_eq!(
            AttachmentChange::from_request(None, false),
            Ok(AttachmentChange::Keep)
        );
    }

    #[test]
    fn supersede_deletes_only_a_different_old_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path());
        store.put("profile-1.png", b"one").unwrap();
        store.put("profile-2.png", b"two").unwrap();
        let lifecycle = AttachmentLifecycle::new(&store, AttachmentPolicy::profile_picture());

        lifecycle.supersede(Some("profile-2.png"), Some("profile-2.png"));
        assert!(store.exists("profile-2.png").unwrap());

        lifecycle.supersede(None, Some("profile-2.png"));
        lifecycle.supersede(Some("profile-1.png"), Some("profile-2.png"));
        assert!(!store.exists("profile-1.png").unwrap());
        assert!(store.exists("profile-2.png").unwrap());
    }

    #[test]
    fn supersede_swallows_delete_failures() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path());
        let lifecycle = AttachmentLifecycle::new(&store, AttachmentPolicy::profile_picture());
        // Invalid names fail inside the store; the call must still return.
        lifecycle.supersede(Some("../outside.png"), None);
        lifecycle.supersede(Some("gone.png"), None);
    }

    #[test]
    fn store_incoming_uses_policy_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::new(dir.path());
        let lifecycle = AttachmentLifecycle::new(&store, AttachmentPolicy::project_media());
        let reference = lifecycle
            .store_incoming(&IncomingFile::new("part.stl", b"solid".to_vec()))
            .unwrap();
        assert!(reference.starts_with("project-"));
        assert!(reference.ends_with(".stl"));
        assert_eq!(store.read(&reference).unwrap(), b"solid");
    }
}
