//! Rendered statements ready to run against a pool.

use sqlweave_core::{render, validate, BoundParameters, ParameterSession, SqlNode};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::debug;

use crate::arguments::{SqliteParameters, SqliteQuery};
use crate::error::Result;

/// A validated, rendered statement and the values bound for it.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    sql: String,
    parameters: SqliteParameters,
}

impl PreparedStatement {
    /// Validates and renders `node`, then binds the static placeholders of
    /// `session` it contains.
    ///
    /// The statement takes the positions `session` hands out while it
    /// renders. Other placeholders are bound through
    /// [`Self::parameters_mut`].
    ///
    /// # Errors
    ///
    /// Returns a validation, render or bind error.
    pub fn prepare(node: &dyn SqlNode, session: &ParameterSession) -> Result<Self> {
        validate(node)?;
        let start = session.next_index();
        let sql = render(node)?;
        let end = session.next_index();

        let mut statics = BoundParameters::new();
        session.bind_all(&mut statics)?;
        let mut parameters = SqliteParameters::new(start..end);
        for index in start..end {
            if let Some(bound) = statics.get(index) {
                parameters.insert_bound(index, bound)?;
            }
        }

        debug!(sql = %sql, parameters = end - start, "Prepared statement");
        Ok(Self { sql, parameters })
    }

    /// The rendered SQL.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Target for binding the remaining placeholders.
    pub fn parameters_mut(&mut self) -> &mut SqliteParameters {
        &mut self.parameters
    }

    /// Builds the sqlx query with every value bound.
    ///
    /// # Errors
    ///
    /// Returns a bind error if a position has no value.
    pub fn query(&self) -> Result<SqliteQuery<'_>> {
        Ok(self.parameters.bind_to(sqlx::query(&self.sql))?)
    }

    /// Runs the statement and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns a bind or database error.
    pub async fn execute(&self, pool: &SqlitePool) -> Result<u64> {
        debug!(sql = %self.sql, "Executing SQL");
        let result = self.query()?.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Runs the statement and returns every row.
    ///
    /// # Errors
    ///
    /// Returns a bind or database error.
    pub async fn fetch_all(&self, pool: &SqlitePool) -> Result<Vec<SqliteRow>> {
        debug!(sql = %self.sql, "Fetching rows");
        Ok(self.query()?.fetch_all(pool).await?)
    }
}
