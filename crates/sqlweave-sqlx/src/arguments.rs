//! Collecting bound values and handing them to a sqlx query.

use std::ops::Range;

use sqlweave_core::{Bound, BoundParameters, BindError, ParameterTarget, SqlType, SqlValue};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use tracing::trace;

/// A sqlx SQLite query with its argument buffer.
pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Values bound for the positions one statement occupies.
///
/// Placeholders bind into this by position, in any order. The values are
/// handed to sqlx in position order by [`Self::bind_to`].
#[derive(Debug, Clone)]
pub struct SqliteParameters {
    positions: Range<usize>,
    bound: BoundParameters,
}

impl SqliteParameters {
    /// Accepts values for `positions`.
    #[must_use]
    pub fn new(positions: Range<usize>) -> Self {
        Self {
            positions,
            bound: BoundParameters::new(),
        }
    }

    /// The positions this statement occupies.
    #[must_use]
    pub fn positions(&self) -> Range<usize> {
        self.positions.clone()
    }

    /// Number of values bound so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// Returns true if nothing was bound yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Binds every value to `query` in position order.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::MissingPosition`] for the first position that
    /// has no value.
    pub fn bind_to<'q>(&self, mut query: SqliteQuery<'q>) -> Result<SqliteQuery<'q>, BindError> {
        for index in self.positions() {
            let bound = self
                .bound
                .get(index)
                .ok_or(BindError::MissingPosition(index))?;
            query = bind_bound(query, bound.clone());
        }
        trace!(count = self.positions.len(), "arguments bound");
        Ok(query)
    }

    pub(crate) fn insert_bound(&mut self, index: usize, bound: &Bound) -> Result<(), BindError> {
        match bound {
            Bound::Value(value) => self.set_value(index, value),
            Bound::Null(sql_type) => self.set_null(index, *sql_type),
        }
    }

    fn check_position(&self, index: usize) -> Result<(), BindError> {
        if self.positions.contains(&index) {
            return Ok(());
        }
        Err(BindError::Target(
            format!(
                "position {index} is outside the statement range {}..{}",
                self.positions.start, self.positions.end
            )
            .into(),
        ))
    }
}

impl ParameterTarget for SqliteParameters {
    fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<(), BindError> {
        self.check_position(index)?;
        self.bound.set_value(index, value)
    }

    fn set_null(&mut self, index: usize, sql_type: SqlType) -> Result<(), BindError> {
        self.check_position(index)?;
        self.bound.set_null(index, sql_type)
    }
}

/// Binds one value; a NULL is bound as an absent value of its declared type.
fn bind_bound(query: SqliteQuery<'_>, bound: Bound) -> SqliteQuery<'_> {
    match bound {
        Bound::Value(SqlValue::Null) => query.bind(Option::<i64>::None),
        Bound::Value(SqlValue::Bool(b)) => query.bind(b),
        Bound::Value(SqlValue::Int(i)) => query.bind(i),
        Bound::Value(SqlValue::Float(f)) => query.bind(f),
        Bound::Value(SqlValue::Text(s)) => query.bind(s),
        Bound::Value(SqlValue::Blob(b)) => query.bind(b),
        Bound::Null(sql_type) => match sql_type {
            SqlType::Boolean => query.bind(Option::<bool>::None),
            SqlType::Null | SqlType::Integer => query.bind(Option::<i64>::None),
            SqlType::Real => query.bind(Option::<f64>::None),
            SqlType::Text => query.bind(Option::<String>::None),
            SqlType::Blob => query.bind(Option::<Vec<u8>>::None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_foreign_positions() {
        let mut params = SqliteParameters::new(3..5);
        assert!(params.set_value(3, &SqlValue::Int(1)).is_ok());
        assert!(params.set_null(4, SqlType::Text).is_ok());
        assert!(matches!(
            params.set_value(5, &SqlValue::Int(1)),
            Err(BindError::Target(_))
        ));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_missing_position() {
        let mut params = SqliteParameters::new(1..3);
        params.set_value(2, &SqlValue::Int(1)).unwrap();
        let err = params.bind_to(sqlx::query("SELECT ?, ?")).err().expect("expected an error");
        assert!(matches!(err, BindError::MissingPosition(1)));
    }

    #[test]
    fn test_empty_range_binds_nothing() {
        let params = SqliteParameters::new(1..1);
        assert!(params.is_empty());
        assert!(params.bind_to(sqlx::query("SELECT 1")).is_ok());
    }
}
