//! Storage backend contract for singleton tables and its SQLite adapter.
//!
//! # Responsibility
//! - Expose the narrow capability set the singleton store is written
//!   against: get-latest, insert, update, delete-by-id, plus a transaction
//!   scope.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Statements only ever name columns declared in the table's `TableSpec`
//!   (plus `id`), so identifiers interpolated into SQL are static.
//! - Every successful insert or update bumps `revision`.

use crate::db::DbError;
use crate::model::field::{FieldSet, FieldValue, StoredRow};
use crate::model::singleton::TableSpec;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure for singleton reads and writes.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound { table: &'static str, id: i64 },
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "row {id} not found in `{table}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-indexed relational table capability set.
///
/// Implementations decide whether `atomically` is a real transaction; the
/// store only relies on it to group its load-then-write sequence.
pub trait RecordBackend {
    /// Returns the row with the highest id, if any.
    fn get_latest(&self, table: &TableSpec) -> StoreResult<Option<StoredRow>>;
    /// Inserts one row and returns its id.
    fn insert(&self, table: &TableSpec, fields: &FieldSet) -> StoreResult<i64>;
    /// Replaces the given columns of one row.
    fn update(&self, table: &TableSpec, id: i64, fields: &FieldSet) -> StoreResult<()>;
    fn delete(&self, table: &TableSpec, id: i64) -> StoreResult<()>;
    /// Runs `work` as one unit; a returned error discards its writes.
    fn atomically<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Self) -> StoreResult<T>;
}

/// SQLite-backed singleton table adapter.
pub struct SqliteRecordBackend<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordBackend<'conn> {
    /// Wraps a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordBackend for SqliteRecordBackend<'_> {
    fn get_latest(&self, table: &TableSpec) -> StoreResult<Option<StoredRow>> {
        let sql = format!(
            "SELECT id, revision, {} FROM {} ORDER BY id DESC LIMIT 1;",
            table.columns.join(", "),
            table.name
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut fields = FieldSet::new();
        for (offset, column) in table.columns.iter().enumerate() {
            let value = decode_value(table, column, row.get_ref(offset + 2)?)?;
            fields.push(*column, value);
        }

        Ok(Some(StoredRow {
            id: row.get(0)?,
            revision: row.get(1)?,
            fields,
        }))
    }

    fn insert(&self, table: &TableSpec, fields: &FieldSet) -> StoreResult<i64> {
        ensure_known_columns(table, fields, true)?;

        let columns = fields
            .iter()
            .map(|(column, _)| *column)
            .collect::<Vec<_>>();
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>();
        let sql = format!(
            "INSERT INTO {} ({}, revision) VALUES ({}, 1);",
            table.name,
            columns.join(", "),
            placeholders.join(", ")
        );

        self.conn
            .execute(&sql, params_from_iter(fields.iter().map(|(_, v)| to_sql_value(v))))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, table: &TableSpec, id: i64, fields: &FieldSet) -> StoreResult<()> {
        ensure_known_columns(table, fields, false)?;
        if fields.is_empty() {
            return Err(StoreError::InvalidData(format!(
                "update of `{}` carries no columns",
                table.name
            )));
        }

        let assignments = fields
            .iter()
            .enumerate()
            .map(|(index, (column, _))| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>();
        let sql = format!(
            "UPDATE {} SET {}, revision = revision + 1 WHERE id = ?{};",
            table.name,
            assignments.join(", "),
            fields.len() + 1
        );

        let mut values = fields
            .iter()
            .map(|(_, value)| to_sql_value(value))
            .collect::<Vec<_>>();
        values.push(Value::Integer(id));

        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                table: table.name,
                id,
            });
        }
        Ok(())
    }

    fn delete(&self, table: &TableSpec, id: i64) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1;", table.name), [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                table: table.name,
                id,
            });
        }
        Ok(())
    }

    fn atomically<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Self) -> StoreResult<T>,
    {
        // Dropping `tx` without commit rolls back.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let output = work(self)?;
        tx.commit()?;
        Ok(output)
    }
}

fn ensure_known_columns(table: &TableSpec, fields: &FieldSet, allow_id: bool) -> StoreResult<()> {
    for (column, _) in fields.iter() {
        let known = table.columns.contains(column) || (allow_id && *column == "id");
        if !known {
            return Err(StoreError::InvalidData(format!(
                "column `{column}` is not part of `{}`",
                table.name
            )));
        }
    }
    Ok(())
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Text(text) => Value::Text(text.clone()),
        FieldValue::Integer(number) => Value::Integer(*number),
    }
}

fn decode_value(table: &TableSpec, column: &str, value: ValueRef<'_>) -> StoreResult<FieldValue> {
    match value {
        ValueRef::Null => Ok(FieldValue::Null),
        ValueRef::Integer(number) => Ok(FieldValue::Integer(number)),
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(FieldValue::Text)
            .map_err(|_| {
                StoreError::InvalidData(format!(
                    "non UTF-8 text in {}.{column}",
                    table.name
                ))
            }),
        ValueRef::Real(_) | ValueRef::Blob(_) => Err(StoreError::InvalidData(format!(
            "unsupported value type in {}.{column}",
            table.name
        ))),
    }
}
