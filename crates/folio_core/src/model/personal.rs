//! Personal details record: contact data, profile links and profile picture.

use crate::model::field::{FieldSet, FieldValue};
use crate::model::lenient;
use crate::model::singleton::{SingletonKind, SingletonRecord, TableSpec};
use crate::model::validation::{check_email, check_url, normalize_text, ValidationError};
use serde::{Deserialize, Serialize};

const PERSONAL_DETAILS_COLUMNS: &[&str] = &[
    "name",
    "email",
    "phone",
    "location",
    "bio",
    "work_contact",
    "portfolio_url",
    "linkedin_url",
    "github_url",
    "gitlab_url",
    "orcid_url",
    "google_scholar_url",
    "profile_picture",
];

/// Owner profile shown in the site header and contact section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalDetails {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub bio: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub work_contact: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub portfolio_url: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub linkedin_url: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub github_url: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub gitlab_url: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub orcid_url: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub google_scholar_url: Option<String>,
    /// Stored file name of the profile picture.
    ///
    /// Never read from payloads: the attachment lifecycle owns this value.
    #[serde(skip_deserializing)]
    pub profile_picture: Option<String>,
}

impl PersonalDetails {
    fn urls(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("portfolio_url", self.portfolio_url.as_deref()),
            ("linkedin_url", self.linkedin_url.as_deref()),
            ("github_url", self.github_url.as_deref()),
            ("gitlab_url", self.gitlab_url.as_deref()),
            ("orcid_url", self.orcid_url.as_deref()),
            ("google_scholar_url", self.google_scholar_url.as_deref()),
        ]
    }
}

impl SingletonRecord for PersonalDetails {
    const KIND: SingletonKind = SingletonKind::PersonalDetails;
    const TABLE: TableSpec = TableSpec {
        name: "personal_details",
        columns: PERSONAL_DETAILS_COLUMNS,
    };
    const ATTACHMENT_COLUMN: Option<&'static str> = Some("profile_picture");

    fn to_fields(&self) -> FieldSet {
        FieldSet::new()
            .with("name", FieldValue::from_text(self.name.as_deref()))
            .with("email", FieldValue::from_text(self.email.as_deref()))
            .with("phone", FieldValue::from_text(self.phone.as_deref()))
            .with("location", FieldValue::from_text(self.location.as_deref()))
            .with("bio", FieldValue::from_text(self.bio.as_deref()))
            .with(
                "work_contact",
                FieldValue::from_text(self.work_contact.as_deref()),
            )
            .with(
                "portfolio_url",
                FieldValue::from_text(self.portfolio_url.as_deref()),
            )
            .with(
                "linkedin_url",
                FieldValue::from_text(self.linkedin_url.as_deref()),
            )
            .with("github_url", FieldValue::from_text(self.github_url.as_deref()))
            .with("gitlab_url", FieldValue::from_text(self.gitlab_url.as_deref()))
            .with("orcid_url", FieldValue::from_text(self.orcid_url.as_deref()))
            .with(
                "google_scholar_url",
                FieldValue::from_text(self.google_scholar_url.as_deref()),
            )
            .with(
                "profile_picture",
                FieldValue::from_text(self.profile_picture.as_deref()),
            )
    }

    fn from_fields(fields: &FieldSet) -> Result<Self, String> {
        Ok(Self {
            name: fields.text("name")?,
            email: fields.text("email")?,
            phone: fields.text("phone")?,
            location: fields.text("location")?,
            bio: fields.text("bio")?,
            work_contact: fields.text("work_contact")?,
            portfolio_url: fields.text("portfolio_url")?,
            linkedin_url: fields.text("linkedin_url")?,
            github_url: fields.text("github_url")?,
            gitlab_url: fields.text("gitlab_url")?,
            orcid_url: fields.text("orcid_url")?,
            google_scholar_url: fields.text("google_scholar_url")?,
            profile_picture: fields.text("profile_picture")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_email("email", self.email.as_deref())?;
        for (field, value) in self.urls() {
            check_url(field, value)?;
        }
        Ok(())
    }

    fn normalize(self) -> Self {
        Self {
            name: normalize_text(self.name),
            email: normalize_text(self.email),
            phone: normalize_text(self.phone),
            location: normalize_text(self.location),
            bio: normalize_text(self.bio),
            work_contact: normalize_text(self.work_contact),
            portfolio_url: normalize_text(self.portfolio_url),
            linkedin_url: normalize_text(self.linkedin_url),
            github_url: normalize_text(self.github_url),
            gitlab_url: normalize_text(self.gitlab_url),
            orcid_url: normalize_text(self.orcid_url),
            google_scholar_url: normalize_text(self.google_scholar_url),
            profile_picture: self.profile_picture,
        }
    }

    fn attachment(&self) -> Option<&str> {
        self.profile_picture.as_deref()
    }

    fn set_attachment(&mut self, reference: Option<String>) {
        self.profile_picture = reference;
    }
}
