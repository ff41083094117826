//! HTTP-shaped entry points for singleton records.
//!
//! # Responsibility
//! - Translate request bodies into store calls and store results into
//!   status + JSON envelopes.
//! - Keep error exposure coarse: validation messages are returned verbatim,
//!   storage details are logged and replaced by a generic message.
//!
//! # Invariants
//! - Handlers never panic and always produce an envelope.
//! - A rejected session never reaches storage.

use crate::attachment::file_store::FileStore;
use crate::attachment::lifecycle::AttachmentChange;
use crate::attachment::policy::IncomingFile;
use crate::model::lenient;
use crate::model::singleton::SingletonRecord;
use crate::model::validation::ValidationError;
use crate::repo::singleton_repo::RecordBackend;
use crate::service::singleton_service::{SingleRecordStore, UpsertError};
use log::error;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Removal flag names accepted besides `remove_<attachment column>`.
const REMOVE_FLAG_ALIASES: &[&str] = &["remove_picture", "remove_attachment"];

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "success": false, "message": message.into() }),
        }
    }

    pub fn unauthorized() -> Self {
        Self::rejected(401, "Unauthorized")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Pre-handler authorization signal. Identity is not inspected.
pub trait SessionGate {
    fn is_authorized(&self) -> bool;
}

impl SessionGate for bool {
    fn is_authorized(&self) -> bool {
        *self
    }
}

/// Runs `handler` only when `gate` passes.
pub fn guarded<G, H>(gate: &G, handler: H) -> ApiResponse
where
    G: SessionGate + ?Sized,
    H: FnOnce() -> ApiResponse,
{
    if gate.is_authorized() {
        handler()
    } else {
        ApiResponse::unauthorized()
    }
}

/// Multipart form post: text fields plus an optional file part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    pub fields: BTreeMap<String, String>,
    pub file: Option<IncomingFile>,
}

/// Body of a singleton write.
#[derive(Debug, Clone, PartialEq)]
pub enum SingletonRequest {
    /// JSON object; cannot carry a file.
    Json(Value),
    Form(FormSubmission),
}

/// Serves the current record, or the record's empty response when no row
/// exists yet.
pub fn get_singleton<R, B, F>(store: &SingleRecordStore<R, B, F>) -> ApiResponse
where
    R: SingletonRecord,
    B: RecordBackend,
    F: FileStore,
{
    let kind = R::KIND;
    match store.get() {
        Ok(Some(record)) => match serde_json::to_value(&record) {
            Ok(body) => ApiResponse::ok(body),
            Err(err) => {
                error!(
                    "event=api_get module=api status=error kind={} error_code=encode_failed error={}",
                    kind, err
                );
                ApiResponse {
                    status: 500,
                    body: json!({ "error": format!("Failed to load {kind}") }),
                }
            }
        },
        Ok(None) => ApiResponse::ok(R::empty_response()),
        Err(err) => {
            error!(
                "event=api_get module=api status=error kind={} error_code=storage_failed error={}",
                kind, err
            );
            ApiResponse {
                status: 500,
                body: json!({ "error": format!("Failed to load {kind}") }),
            }
        }
    }
}

/// Applies a write request and reports `{success, <attachment column>}`.
pub fn post_singleton<R, B, F>(
    store: &SingleRecordStore<R, B, F>,
    request: SingletonRequest,
) -> ApiResponse
where
    R: SingletonRecord,
    B: RecordBackend,
    F: FileStore,
{
    let kind = R::KIND;
    let (record, change) = match decode_request::<R>(request) {
        Ok(decoded) => decoded,
        Err(err) => return ApiResponse::rejected(400, err.to_string()),
    };

    match store.upsert(record, change) {
        Ok(outcome) => {
            let mut body = Map::new();
            body.insert("success".to_string(), Value::Bool(true));
            if let Some(column) = R::ATTACHMENT_COLUMN {
                let reference = outcome.record.attachment().map(str::to_string);
                body.insert(
                    column.to_string(),
                    reference.map_or(Value::Null, Value::String),
                );
            }
            ApiResponse::ok(Value::Object(body))
        }
        Err(UpsertError::Validation(err)) => ApiResponse::rejected(400, err.to_string()),
        Err(err) => {
            error!(
                "event=api_post module=api status=error kind={} error={}",
                kind, err
            );
            ApiResponse::rejected(500, format!("Failed to save {kind}"))
        }
    }
}

/// Splits a request into the record payload and the attachment change.
pub fn decode_request<R: SingletonRecord>(
    request: SingletonRequest,
) -> Result<(R, AttachmentChange), ValidationError> {
    let (mut object, file) = match request {
        SingletonRequest::Json(Value::Object(object)) => (object, None),
        SingletonRequest::Json(_) => {
            return Err(ValidationError::MalformedBody(
                "expected a JSON object".to_string(),
            ))
        }
        SingletonRequest::Form(form) => {
            let object = form
                .fields
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect::<Map<_, _>>();
            (object, form.file)
        }
    };

    let remove = take_remove_flag::<R>(&mut object)?;
    let change = AttachmentChange::from_request(file, remove)?;
    let record = serde_json::from_value::<R>(Value::Object(object))
        .map_err(|err| ValidationError::MalformedBody(err.to_string()))?;
    Ok((record, change))
}

fn take_remove_flag<R: SingletonRecord>(
    object: &mut Map<String, Value>,
) -> Result<bool, ValidationError> {
    let column_flag = R::ATTACHMENT_COLUMN.map(|column| format!("remove_{column}"));
    let names = REMOVE_FLAG_ALIASES
        .iter()
        .map(|name| name.to_string())
        .chain(column_flag);

    let mut remove = false;
    for name in names {
        let Some(value) = object.remove(&name) else {
            continue;
        };
        remove |=
            lenient::flag(value).map_err(|_| ValidationError::MalformedFlag { flag: name })?;
    }
    Ok(remove)
}
