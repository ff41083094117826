//! User-facing validation errors and field format checks.
//!
//! # Invariants
//! - Validation runs before any storage or file-store mutation.
//! - Blank optional values are accepted; only present values are checked.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static WHATSAPP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[0-9][0-9 \-]{5,}$").expect("valid whatsapp regex"));

/// Rejection reported to the caller; never a server fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Uploaded file has no bytes.
    EmptyFile { file_name: String },
    /// Uploaded file exceeds the policy ceiling.
    FileTooLarge { size: u64, max_bytes: u64 },
    /// Uploaded file extension is missing or not allow-listed.
    DisallowedExtension { file_name: String },
    /// Declared content type is not allow-listed.
    DisallowedContentType { content_type: String },
    /// A field value does not match its expected format.
    MalformedField {
        field: &'static str,
        reason: &'static str,
    },
    /// A request flag is not a recognizable boolean.
    MalformedFlag { flag: String },
    /// Request carried both a new upload and a removal flag.
    ConflictingAttachmentChange,
    /// Record type has no attachment slot but a file was supplied.
    AttachmentNotSupported { table: &'static str },
    /// Request body could not be decoded into the record shape.
    MalformedBody(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFile { file_name } => write!(f, "uploaded file `{file_name}` is empty"),
            Self::FileTooLarge { size, max_bytes } => write!(
                f,
                "uploaded file is {size} bytes; the limit is {max_bytes} bytes"
            ),
            Self::DisallowedExtension { file_name } => {
                write!(f, "file type of `{file_name}` is not allowed")
            }
            Self::DisallowedContentType { content_type } => {
                write!(f, "content type `{content_type}` is not allowed")
            }
            Self::MalformedField { field, reason } => write!(f, "invalid `{field}`: {reason}"),
            Self::MalformedFlag { flag } => write!(f, "invalid `{flag}`: expected a boolean flag"),
            Self::ConflictingAttachmentChange => write!(
                f,
                "a new file and a removal request cannot be combined in one update"
            ),
            Self::AttachmentNotSupported { table } => {
                write!(f, "`{table}` does not accept file attachments")
            }
            Self::MalformedBody(message) => write!(f, "malformed request body: {message}"),
        }
    }
}

impl Error for ValidationError {}

/// Checks an optional email field.
pub fn check_email(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(text) if !EMAIL_RE.is_match(text) => Err(ValidationError::MalformedField {
            field,
            reason: "expected an email address",
        }),
        _ => Ok(()),
    }
}

/// Checks an optional WhatsApp number: `+`, then digits, spaces or dashes.
pub fn check_whatsapp_number(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(text) if !WHATSAPP_RE.is_match(text) => Err(ValidationError::MalformedField {
            field,
            reason: "expected `+` followed by digits, spaces or dashes",
        }),
        _ => Ok(()),
    }
}

/// Checks an optional absolute http(s) URL field.
pub fn check_url(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(text)
            if !(text.starts_with("http://") || text.starts_with("https://"))
                || text.contains(char::is_whitespace) =>
        {
            Err(ValidationError::MalformedField {
                field,
                reason: "expected an http:// or https:// URL",
            })
        }
        _ => Ok(()),
    }
}

/// Trims a text value and maps blank input to `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{check_email, check_url, check_whatsapp_number, normalize_text, ValidationError};

    #[test]
    fn email_check_accepts_absent_and_rejects_garbage() {
        assert!(check_email("email", None).is_ok());
        assert!(check_email("email", Some("ann@example.com")).is_ok());
        assert!(matches!(
            check_email("email", Some("not-an-address")),
            Err(ValidationError::MalformedField { field: "email", .. })
        ));
    }

    #[test]
    fn whatsapp_number_requires_international_prefix() {
        assert!(check_whatsapp_number("whatsapp_number", Some("+44 7700 900123")).is_ok());
        assert!(check_whatsapp_number("whatsapp_number", Some("+1-555-0100")).is_ok());
        assert!(check_whatsapp_number("whatsapp_number", Some("07700 900123")).is_err());
        assert!(check_whatsapp_number("whatsapp_number", Some("call me")).is_err());
    }

    #[test]
    fn url_check_requires_scheme() {
        assert!(check_url("github_url", Some("https://github.com/ann")).is_ok());
        assert!(check_url("github_url", Some("github.com/ann")).is_err());
        assert!(check_url("github_url", Some("https://x.com/a b")).is_err());
    }

    #[test]
    fn normalize_text_maps_blank_to_none() {
        assert_eq!(normalize_text(Some("  ".to_string())), None);
        assert_eq!(
            normalize_text(Some(" Ann ".to_string())).as_deref(),
            Some("Ann")
        );
    }
}
