//! Reading sqlx SQLite rows by recorded position.

use std::fmt;

use sqlweave_core::{ReadError, RowSource, SqlValue};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// A [`RowSource`] over a SQLite row; position 1 is the first column.
#[derive(Clone, Copy)]
pub struct SqliteRowSource<'r> {
    row: &'r SqliteRow,
}

impl fmt::Debug for SqliteRowSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteRowSource")
            .field("columns", &self.row.len())
            .finish()
    }
}

impl<'r> SqliteRowSource<'r> {
    /// Wraps `row`.
    #[must_use]
    pub const fn new(row: &'r SqliteRow) -> Self {
        Self { row }
    }

    fn decode<T>(&self, column: usize) -> Result<T, ReadError>
    where
        T: for<'a> sqlx::Decode<'a, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
    {
        self.row
            .try_get(column)
            .map_err(|e| ReadError::Source(Box::new(e)))
    }
}

impl RowSource for SqliteRowSource<'_> {
    fn value(&self, index: usize) -> Result<SqlValue, ReadError> {
        let column = index
            .checked_sub(1)
            .filter(|&i| i < self.row.len())
            .ok_or(ReadError::NoSuchColumn(index))?;
        let raw = self
            .row
            .try_get_raw(column)
            .map_err(|e| ReadError::Source(Box::new(e)))?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }
        let type_name = raw.type_info().name().to_owned();
        match type_name.as_str() {
            "INTEGER" => self.decode(column).map(SqlValue::Int),
            "REAL" => self.decode(column).map(SqlValue::Float),
            "TEXT" => self.decode(column).map(SqlValue::Text),
            "BLOB" => self.decode(column).map(SqlValue::Blob),
            "BOOLEAN" => self.decode(column).map(SqlValue::Bool),
            other => Err(ReadError::Source(
                format!("unsupported column type {other} at position {index}").into(),
            )),
        }
    }
}
