//! Contact-message notification settings record.

use crate::model::field::{FieldSet, FieldValue};
use crate::model::lenient;
use crate::model::singleton::{SingletonKind, SingletonRecord, TableSpec};
use crate::model::validation::{
    check_email, check_whatsapp_number, normalize_text, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const NOTIFICATION_SETTINGS_COLUMNS: &[&str] = &[
    "email_notifications",
    "whatsapp_notifications",
    "notification_email",
    "whatsapp_number",
];

/// Delivery channel for new contact-message notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    WhatsApp,
}

/// Flags are serialized as `0`/`1` to keep the stored column shape on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    #[serde(deserialize_with = "lenient::flag", serialize_with = "lenient::flag_as_int")]
    pub email_notifications: bool,
    #[serde(deserialize_with = "lenient::flag", serialize_with = "lenient::flag_as_int")]
    pub whatsapp_notifications: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub notification_email: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub whatsapp_number: Option<String>,
}

impl NotificationSettings {
    /// Channels that would actually deliver: enabled and with a destination.
    pub fn active_channels(&self) -> Vec<NotificationChannel> {
        let mut channels = Vec::new();
        if self.email_notifications && self.notification_email.is_some() {
            channels.push(NotificationChannel::Email);
        }
        if self.whatsapp_notifications && self.whatsapp_number.is_some() {
            channels.push(NotificationChannel::WhatsApp);
        }
        channels
    }
}

impl SingletonRecord for NotificationSettings {
    const KIND: SingletonKind = SingletonKind::NotificationSettings;
    const TABLE: TableSpec = TableSpec {
        name: "notification_settings",
        columns: NOTIFICATION_SETTINGS_COLUMNS,
    };

    fn to_fields(&self) -> FieldSet {
        FieldSet::new()
            .with(
                "email_notifications",
                FieldValue::from_flag(self.email_notifications),
            )
            .with(
                "whatsapp_notifications",
                FieldValue::from_flag(self.whatsapp_notifications),
            )
            .with(
                "notification_email",
                FieldValue::from_text(self.notification_email.as_deref()),
            )
            .with(
                "whatsapp_number",
                FieldValue::from_text(self.whatsapp_number.as_deref()),
            )
    }

    fn from_fields(fields: &FieldSet) -> Result<Self, String> {
        Ok(Self {
            email_notifications: fields.flag("email_notifications")?,
            whatsapp_notifications: fields.flag("whatsapp_notifications")?,
            notification_email: fields.text("notification_email")?,
            whatsapp_number: fields.text("whatsapp_number")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_email("notification_email", self.notification_email.as_deref())?;
        check_whatsapp_number("whatsapp_number", self.whatsapp_number.as_deref())?;
        Ok(())
    }

    fn normalize(self) -> Self {
        Self {
            notification_email: normalize_text(self.notification_email),
            whatsapp_number: normalize_text(self.whatsapp_number),
            ..self
        }
    }

    fn empty_response() -> Value {
        json!({ "email_notifications": 0, "whatsapp_notifications": 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationChannel, NotificationSettings};
    use serde_json::json;

    #[test]
    fn flags_accept_form_strings_and_numbers() {
        let settings: NotificationSettings = serde_json::from_value(json!({
            "email_notifications": "on",
            "whatsapp_notifications": 0
        }))
        .unwrap();
        assert!(settings.email_notifications);
        assert!(!settings.whatsapp_notifications);
    }

    #[test]
    fn flags_serialize_as_integers() {
        let settings = NotificationSettings {
            email_notifications: true,
            ..NotificationSettings::default()
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["email_notifications"], json!(1));
        assert_eq!(value["whatsapp_notifications"], json!(0));
    }

    #[test]
    fn active_channels_require_flag_and_destination() {
        let settings = NotificationSettings {
            email_notifications: true,
            whatsapp_notifications: true,
            notification_email: Some("me@example.com".to_string()),
            whatsapp_number: None,
        };
        assert_eq!(settings.active_channels(), vec![NotificationChannel::Email]);
    }
}
