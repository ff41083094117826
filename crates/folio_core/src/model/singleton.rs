//! Singleton record contract.
//!
//! # Responsibility
//! - Describe how a configuration-like record maps onto one table row.
//! - Name the singleton entities exposed by the admin surface.
//!
//! # Invariants
//! - `to_fields` always yields every column in `TableSpec::columns`, so an
//!   update is a full replace rather than a patch.
//! - Only records with `ATTACHMENT_COLUMN` set carry an attachment slot.

use crate::model::field::FieldSet;
use crate::model::validation::ValidationError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Primary key every singleton row is pinned to.
pub const SINGLETON_ROW_ID: i64 = 1;

/// Static table layout for one singleton entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    /// Data columns, excluding `id` and `revision`.
    pub columns: &'static [&'static str],
}

/// A record type persisted as the single current row of its table.
pub trait SingletonRecord: Sized + Clone + Default + Serialize + DeserializeOwned {
    const KIND: SingletonKind;
    const TABLE: TableSpec;
    /// Column holding the stored attachment name, if the record has a slot.
    const ATTACHMENT_COLUMN: Option<&'static str> = None;

    /// Encodes every column of the record.
    fn to_fields(&self) -> FieldSet;

    /// Decodes a stored row. Errors describe the offending column.
    fn from_fields(fields: &FieldSet) -> Result<Self, String>;

    /// Checks field formats before any write.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Trims text fields and maps blank values to null.
    fn normalize(self) -> Self {
        self
    }

    fn attachment(&self) -> Option<&str> {
        None
    }

    fn set_attachment(&mut self, _reference: Option<String>) {}

    /// JSON served when no row exists yet.
    fn empty_response() -> Value {
        json!({})
    }
}

/// Singleton entities managed by the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingletonKind {
    PersonalDetails,
    About,
    NotificationSettings,
}

pub const SINGLETON_KIND_PERSONAL_DETAILS: &str = "personal-details";
pub const SINGLETON_KIND_ABOUT: &str = "about";
pub const SINGLETON_KIND_NOTIFICATION_SETTINGS: &str = "notification-settings";

impl SingletonKind {
    pub const ALL: [SingletonKind; 3] = [
        Self::PersonalDetails,
        Self::About,
        Self::NotificationSettings,
    ];

    /// Route segment used by the admin surface.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PersonalDetails => SINGLETON_KIND_PERSONAL_DETAILS,
            Self::About => SINGLETON_KIND_ABOUT,
            Self::NotificationSettings => SINGLETON_KIND_NOTIFICATION_SETTINGS,
        }
    }

    /// Parses a route segment. Underscores are accepted in place of dashes.
    pub fn parse(value: &str) -> Result<Self, UnknownSingletonKind> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            SINGLETON_KIND_PERSONAL_DETAILS => Ok(Self::PersonalDetails),
            SINGLETON_KIND_ABOUT => Ok(Self::About),
            SINGLETON_KIND_NOTIFICATION_SETTINGS => Ok(Self::NotificationSettings),
            _ => Err(UnknownSingletonKind(value.to_string())),
        }
    }
}

impl Display for SingletonKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSingletonKind(pub String);

impl Display for UnknownSingletonKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown record `{}`; expected personal-details|about|notification-settings",
            self.0
        )
    }
}

impl Error for UnknownSingletonKind {}

#[cfg(test)]
mod tests {
    use super::SingletonKind;

    #[test]
    fn parse_round_trips_every_kind() {
        for kind in SingletonKind::ALL {
            assert_eq!(SingletonKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn parse_accepts_table_style_names() {
        assert_eq!(
            SingletonKind::parse("Notification_Settings").unwrap(),
            SingletonKind::NotificationSettings
        );
        assert!(SingletonKind::parse("projects").is_err());
    }
}
