//! About-section summary record.

use crate::model::field::{FieldSet, FieldValue};
use crate::model::lenient;
use crate::model::singleton::{SingletonKind, SingletonRecord, TableSpec};
use crate::model::validation::normalize_text;
use serde::{Deserialize, Serialize};

const ABOUT_COLUMNS: &[&str] = &[
    "summary",
    "experience_years",
    "projects_completed",
    "companies_count",
];

/// Summary text plus the headline counters. Counters are free text so values
/// such as `"5+"` survive unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutSummary {
    #[serde(deserialize_with = "lenient::text")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub experience_years: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub projects_completed: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub companies_count: Option<String>,
}

impl SingletonRecord for AboutSummary {
    const KIND: SingletonKind = SingletonKind::About;
    const TABLE: TableSpec = TableSpec {
        name: "about",
        columns: ABOUT_COLUMNS,
    };

    fn to_fields(&self) -> FieldSet {
        FieldSet::new()
            .with("summary", FieldValue::from_text(self.summary.as_deref()))
            .with(
                "experience_years",
                FieldValue::from_text(self.experience_years.as_deref()),
            )
            .with(
                "projects_completed",
                FieldValue::from_text(self.projects_completed.as_deref()),
            )
            .with(
                "companies_count",
                FieldValue::from_text(self.companies_count.as_deref()),
            )
    }

    fn from_fields(fields: &FieldSet) -> Result<Self, String> {
        Ok(Self {
            summary: fields.text("summary")?,
            experience_years: fields.text("experience_years")?,
            projects_completed: fields.text("projects_completed")?,
            companies_count: fields.text("companies_count")?,
        })
    }

    fn normalize(self) -> Self {
        Self {
            summary: normalize_text(self.summary),
            experience_years: normalize_text(self.experience_years),
            projects_completed: normalize_text(self.projects_completed),
            companies_count: normalize_text(self.companies_count),
        }
    }
}
