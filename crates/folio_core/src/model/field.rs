//! Backend-neutral column values and rows.

/// Single column value as exchanged with a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
}

impl FieldValue {
    /// Maps an optional string to `Text` or `Null`.
    pub fn from_text(value: Option<&str>) -> Self {
        match value {
            Some(text) => Self::Text(text.to_string()),
            None => Self::Null,
        }
    }

    pub fn from_flag(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// Ordered column/value list for one row.
///
/// Column order is the order of insertion and is what adapters use to build
/// statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    entries: Vec<(&'static str, FieldValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one column, replacing the value if the column is already set.
    pub fn push(&mut self, column: &'static str, value: FieldValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == column) {
            entry.1 = value;
            return;
        }
        self.entries.push((column, value));
    }

    /// Builder form of [`FieldSet::push`].
    pub fn with(mut self, column: &'static str, value: FieldValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, FieldValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a nullable text column.
    ///
    /// Missing columns decode as `None`; integer values are rendered as text
    /// since several legacy columns hold numbers in free-text slots.
    pub fn text(&self, column: &str) -> Result<Option<String>, String> {
        match self.get(column) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Text(value)) => Ok(Some(value.clone())),
            Some(FieldValue::Integer(value)) => Ok(Some(value.to_string())),
        }
    }

    /// Reads a 0/1 flag column. Missing and null decode as `false`.
    pub fn flag(&self, column: &str) -> Result<bool, String> {
        match self.get(column) {
            None | Some(FieldValue::Null) => Ok(false),
            Some(FieldValue::Integer(0)) => Ok(false),
            Some(FieldValue::Integer(1)) => Ok(true),
            Some(other) => Err(format!("invalid flag value `{other:?}` in column `{column}`")),
        }
    }
}

/// Row returned by a backend's `get_latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub id: i64,
    /// Number of successful writes applied to this row.
    pub revision: i64,
    pub fields: FieldSet,
}

#[cfg(test)]
mod tests {
    use super::{FieldSet, FieldValue};

    #[test]
    fn push_replaces_existing_column() {
        let mut fields = FieldSet::new().with("name", FieldValue::Text("a".to_string()));
        fields.push("name", FieldValue::Text("b".to_string()));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.text("name").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn text_renders_integers_and_treats_missing_as_none() {
        let fields = FieldSet::new().with("experience_years", FieldValue::Integer(7));
        assert_eq!(
            fields.text("experience_years").unwrap().as_deref(),
            Some("7")
        );
        assert_eq!(fields.text("summary").unwrap(), None);
    }

    #[test]
    fn flag_rejects_values_outside_zero_and_one() {
        let fields = FieldSet::new().with("email_notifications", FieldValue::Integer(2));
        assert!(fields.flag("email_notifications").is_err());
    }
}
