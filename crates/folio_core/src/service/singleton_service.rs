//! Single-row upsert service with attached-file lifecycle.
//!
//! # Responsibility
//! - Persist a singleton record as exactly one row (insert if absent,
//!   full-replace update if present).
//! - Sequence attachment handling around the metadata write.
//!
//! # Invariants
//! - Write order is validate -> store new upload -> metadata write ->
//!   retire superseded file. A failed metadata write leaves the previous
//!   file referenced and intact, and discards the new upload.
//! - The current row is located by the backend's "latest row", never by a
//!   caller-supplied id.
//! - Concurrent upserts are last-write-wins; no writer lock is taken.

use crate::attachment::file_store::{FileStore, FileStoreError};
use crate::attachment::lifecycle::{
    AttachmentChange, AttachmentLifecycle, AttachmentSlot, SlotTransition,
};
use crate::model::field::{FieldValue, StoredRow};
use crate::model::singleton::{SingletonRecord, SINGLETON_ROW_ID};
use crate::model::validation::ValidationError;
use crate::repo::singleton_repo::{RecordBackend, StoreError, StoreResult};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::time::Instant;

/// Failure of one upsert call. Nothing is reported as partially applied.
#[derive(Debug)]
pub enum UpsertError {
    /// Input rejected before any mutation.
    Validation(ValidationError),
    /// Storing the new upload failed; the row was not touched.
    File(FileStoreError),
    /// Metadata read or write failed; the row and old file are unchanged.
    Storage(StoreError),
}

impl Display for UpsertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::File(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UpsertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::File(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for UpsertError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<FileStoreError> for UpsertError {
    fn from(value: FileStoreError) -> Self {
        Self::File(value)
    }
}

impl From<StoreError> for UpsertError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome<R> {
    /// Record as written, including the resolved attachment reference.
    pub record: R,
    /// `true` when this call inserted the row.
    pub created: bool,
    /// Row revision after the write.
    pub revision: i64,
    /// Attachment reference dropped by this write; its file has been
    /// handed to cleanup.
    pub retired_attachment: Option<String>,
}

/// Store for one singleton record type.
///
/// Backend and file store are injected; the store holds no global handles.
pub struct SingleRecordStore<R, B, F>
where
    R: SingletonRecord,
    B: RecordBackend,
    F: FileStore,
{
    backend: B,
    attachments: AttachmentLifecycle<F>,
    _record: PhantomData<R>,
}

impl<R, B, F> SingleRecordStore<R, B, F>
where
    R: SingletonRecord,
    B: RecordBackend,
    F: FileStore,
{
    pub fn new(backend: B, attachments: AttachmentLifecycle<F>) -> Self {
        Self {
            backend,
            attachments,
            _record: PhantomData,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn attachments(&self) -> &AttachmentLifecycle<F> {
        &self.attachments
    }

    /// Returns the current record. Absence is `Ok(None)`, never an error.
    pub fn get(&self) -> StoreResult<Option<R>> {
        let row = self.backend.get_latest(&R::TABLE)?;
        debug!(
            "event=singleton_get module=service status=ok table={} found={}",
            R::TABLE.name,
            row.is_some()
        );
        row.map(|row| decode_record::<R>(&row)).transpose()
    }

    /// Returns the current record or the all-empty default.
    pub fn get_or_default(&self) -> StoreResult<R> {
        Ok(self.get()?.unwrap_or_default())
    }

    /// Writes `record` as the current row and applies `change` to its
    /// attachment slot.
    ///
    /// Every column is written: fields left empty in `record` clear the
    /// stored value. The attachment reference in `record` is ignored; it is
    /// resolved from the stored row and `change`.
    pub fn upsert(
        &self,
        record: R,
        change: AttachmentChange,
    ) -> Result<UpsertOutcome<R>, UpsertError> {
        let started_at = Instant::now();
        let table = R::TABLE.name;

        let mut record = record.normalize();
        record.validate()?;
        if R::ATTACHMENT_COLUMN.is_none() && change != AttachmentChange::Keep {
            return Err(ValidationError::AttachmentNotSupported { table }.into());
        }
        if let AttachmentChange::Replace(file) = &change {
            self.attachments.validate_incoming(file)?;
        }

        let transition = match &change {
            AttachmentChange::Keep => SlotTransition::Keep,
            AttachmentChange::Remove => SlotTransition::Remove,
            AttachmentChange::Replace(file) => {
                SlotTransition::Upload(self.attachments.store_incoming(file)?)
            }
        };
        let uploaded = match &transition {
            SlotTransition::Upload(reference) => Some(reference.clone()),
            _ => None,
        };

        let written = self.backend.atomically(|backend| {
            let current = backend.get_latest(&R::TABLE)?;
            let old_reference = match &current {
                Some(row) => stored_attachment::<R>(row)?,
                None => None,
            };

            let (slot, retired) = AttachmentSlot::from_reference(old_reference).apply(transition);
            record.set_attachment(slot.into_reference());
            let fields = record.to_fields();

            match current {
                Some(row) => {
                    backend.update(&R::TABLE, row.id, &fields)?;
                    Ok((false, row.revision + 1, retired))
                }
                None => {
                    let fields = fields.with("id", FieldValue::Integer(SINGLETON_ROW_ID));
                    backend.insert(&R::TABLE, &fields)?;
                    Ok((true, 1, retired))
                }
            }
        });

        match written {
            Ok((created, revision, retired)) => {
                self.attachments
                    .supersede(retired.as_deref(), record.attachment());
                info!(
                    "event=singleton_upsert module=service status=ok table={} created={} revision={} attachment_retired={} duration_ms={}",
                    table,
                    created,
                    revision,
                    retired.is_some(),
                    started_at.elapsed().as_millis()
                );
                Ok(UpsertOutcome {
                    record,
                    created,
                    revision,
                    retired_attachment: retired,
                })
            }
            Err(err) => {
                if let Some(reference) = uploaded.as_deref() {
                    self.attachments.discard_unreferenced(reference);
                }
                error!(
                    "event=singleton_upsert module=service status=error table={} duration_ms={} error_code=storage_failed error={}",
                    table,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(UpsertError::Storage(err))
            }
        }
    }
}

fn decode_record<R: SingletonRecord>(row: &StoredRow) -> StoreResult<R> {
    R::from_fields(&row.fields)
        .map_err(|message| StoreError::InvalidData(format!("{}: {message}", R::TABLE.name)))
}

fn stored_attachment<R: SingletonRecord>(row: &StoredRow) -> StoreResult<Option<String>> {
    match R::ATTACHMENT_COLUMN {
        Some(column) => row
            .fields
            .text(column)
            .map_err(|message| StoreError::InvalidData(format!("{}: {message}", R::TABLE.name))),
        None => Ok(None),
    }
}
