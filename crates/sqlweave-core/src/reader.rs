//! Projection columns that remember where they were rendered.
//!
//! A [`ColumnSession`] wraps projected expressions in [`ReadColumn`]s.
//! Rendering the statement assigns each of them the next result position,
//! and the typed getters later read that position from a row.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::trace;

use crate::error::{ReadError, RenderError};
use crate::node::{BoxedNode, IntoNode, SqlNode};
use crate::options::SessionOptions;
use crate::sink::SqlWriter;
use crate::validate::Collector;
use crate::value::{SqlType, SqlValue};

/// A result row addressed by position.
pub trait RowSource {
    /// The value at `index`, as recorded by a [`ReadColumn`].
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::NoSuchColumn`] for an unknown position, or a
    /// source failure.
    fn value(&self, index: usize) -> Result<SqlValue, ReadError>;
}

/// Plain values; position 1 is the first element.
impl RowSource for [SqlValue] {
    fn value(&self, index: usize) -> Result<SqlValue, ReadError> {
        index
            .checked_sub(1)
            .and_then(|i| self.get(i))
            .cloned()
            .ok_or(ReadError::NoSuchColumn(index))
    }
}

impl RowSource for Vec<SqlValue> {
    fn value(&self, index: usize) -> Result<SqlValue, ReadError> {
        self.as_slice().value(index)
    }
}

/// Hands out result columns sharing one position counter.
#[derive(Debug)]
pub struct ColumnSession {
    counter: Arc<AtomicUsize>,
}

impl ColumnSession {
    /// Creates a session whose first rendered column gets `start_index`.
    #[must_use]
    pub fn new(start_index: usize) -> Self {
        Self {
            counter: Arc::new(AtomicUsize::new(start_index)),
        }
    }

    /// Creates a session from options.
    #[must_use]
    pub fn with_options(options: &SessionOptions) -> Self {
        Self::new(options.start_index)
    }

    /// Wraps a projected expression.
    #[must_use]
    pub fn column(&self, node: impl IntoNode) -> ReadColumn {
        ReadColumn {
            state: Arc::new(ReadState {
                node: node.into_node(),
                counter: Arc::clone(&self.counter),
                position: OnceLock::new(),
            }),
        }
    }
}

impl Default for ColumnSession {
    fn default() -> Self {
        Self::with_options(&SessionOptions::default())
    }
}

struct ReadState {
    node: BoxedNode,
    counter: Arc<AtomicUsize>,
    position: OnceLock<usize>,
}

/// Single-use result column.
///
/// Clones share state: put one clone in the projection and keep another
/// to read the row.
#[derive(Clone)]
pub struct ReadColumn {
    state: Arc<ReadState>,
}

impl ReadColumn {
    /// The recorded position, or `None` if never rendered.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.state.position.get().copied()
    }

    /// Whether the column was rendered into the statement.
    #[must_use]
    pub fn is_in_statement(&self) -> bool {
        self.index().is_some()
    }

    /// Reads the raw value.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::NotInStatement`] if the column was never
    /// rendered, or whatever the row source reports.
    pub fn get_value(&self, row: &dyn RowSource) -> Result<SqlValue, ReadError> {
        let index = self.index().ok_or(ReadError::NotInStatement)?;
        row.value(index)
    }

    fn get_typed<T>(
        &self,
        row: &dyn RowSource,
        expected: SqlType,
        convert: impl FnOnce(SqlValue) -> Option<T>,
    ) -> Result<Option<T>, ReadError> {
        let value = self.get_value(row)?;
        if value.is_null() {
            return Ok(None);
        }
        let found = value.sql_type();
        match convert(value) {
            Some(v) => Ok(Some(v)),
            None => Err(ReadError::TypeMismatch {
                index: self.index().unwrap_or_default(),
                expected,
                found,
            }),
        }
    }

    /// Reads an integer; NULL reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::TypeMismatch`] for any other type.
    pub fn get_i64(&self, row: &dyn RowSource) -> Result<Option<i64>, ReadError> {
        self.get_typed(row, SqlType::Integer, |value| match value {
            SqlValue::Int(n) => Some(n),
            _ => None,
        })
    }

    /// Reads a float; NULL reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::TypeMismatch`] for any other type.
    pub fn get_f64(&self, row: &dyn RowSource) -> Result<Option<f64>, ReadError> {
        self.get_typed(row, SqlType::Real, |value| match value {
            SqlValue::Float(f) => Some(f),
            _ => None,
        })
    }

    /// Reads a boolean; integers 0 and 1 are accepted as well.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::TypeMismatch`] for any other value.
    pub fn get_bool(&self, row: &dyn RowSource) -> Result<Option<bool>, ReadError> {
        self.get_typed(row, SqlType::Boolean, |value| match value {
            SqlValue::Bool(b) => Some(b),
            SqlValue::Int(0) => Some(false),
            SqlValue::Int(1) => Some(true),
            _ => None,
        })
    }

    /// Reads text; NULL reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::TypeMismatch`] for any other type.
    pub fn get_text(&self, row: &dyn RowSource) -> Result<Option<String>, ReadError> {
        self.get_typed(row, SqlType::Text, |value| match value {
            SqlValue::Text(s) => Some(s),
            _ => None,
        })
    }

    /// Reads a blob; NULL reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::TypeMismatch`] for any other type.
    pub fn get_blob(&self, row: &dyn RowSource) -> Result<Option<Vec<u8>>, ReadError> {
        self.get_typed(row, SqlType::Blob, |value| match value {
            SqlValue::Blob(b) => Some(b),
            _ => None,
        })
    }
}

impl SqlNode for ReadColumn {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        if w.tracks_positions() {
            if let Some(&position) = self.state.position.get() {
                return Err(RenderError::TrackerReused { position });
            }
            let next = self.state.counter.fetch_add(1, Ordering::SeqCst);
            if let Err(position) = self.state.position.set(next) {
                return Err(RenderError::TrackerReused { position });
            }
            trace!(position = next, "result column assigned");
        }
        self.state.node.render(w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        self.state.node.collect(collector);
    }

    fn is_empty(&self) -> bool {
        self.state.node.is_empty()
    }

    fn has_parens(&self) -> bool {
        self.state.node.has_parens()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::render;
    use crate::query::{CustomSql, SelectQuery};

    #[test]
    fn test_columns_read_by_position() {
        let session = ColumnSession::default();
        let id = session.column(CustomSql::new("id"));
        let name = session.column(CustomSql::new("name"));
        let score = session.column(CustomSql::new("score"));
        let unused = session.column(CustomSql::new("unused"));

        let query = SelectQuery::new()
            .column(id.clone())
            .column(name.clone())
            .column(score.clone());
        assert_eq!(render(&query).unwrap(), "SELECT id, name, score");

        let row = vec![
            SqlValue::Int(7),
            SqlValue::Text(String::from("ann")),
            SqlValue::Null,
        ];
        assert_eq!(id.get_i64(&row).unwrap(), Some(7));
        assert_eq!(name.get_text(&row).unwrap().as_deref(), Some("ann"));
        assert_eq!(score.get_f64(&row).unwrap(), None);
        assert!(matches!(
            unused.get_value(&row),
            Err(ReadError::NotInStatement)
        ));
        assert!(matches!(
            name.get_i64(&row),
            Err(ReadError::TypeMismatch {
                index: 2,
                expected: SqlType::Integer,
                found: SqlType::Text
            })
        ));
    }

    #[test]
    fn test_column_burns_after_render() {
        let session = ColumnSession::new(0);
        let column = session.column(CustomSql::new("x"));
        render(&column).unwrap();
        assert_eq!(column.index(), Some(0));
        assert!(matches!(
            render(&column),
            Err(RenderError::TrackerReused { position: 0 })
        ));
    }

    #[test]
    fn test_bool_accepts_integers() {
        let session = ColumnSession::default();
        let flag = session.column(CustomSql::new("flag"));
        render(&flag).unwrap();
        let row = vec![SqlValue::Int(1)];
        assert_eq!(flag.get_bool(&row).unwrap(), Some(true));
        let row = vec![SqlValue::Int(2)];
        assert!(flag.get_bool(&row).is_err());
    }
}
