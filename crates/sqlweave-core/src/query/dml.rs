//! INSERT, UPDATE and DELETE.
//!
//! These statements name a single table, so they render without table
//! aliases.

use indexmap::IndexSet;

use super::condition::ComboCondition;
use super::select::SelectQuery;
use crate::error::{RenderError, ValidationError};
use crate::node::{BoxedNode, IntoNode, SqlNode};
use crate::schema::{DbColumn, TableRef};
use crate::sink::{ContextGuard, SqlWriter};
use crate::validate::{verify_column_tables, Collector, ScopeChain, Verifiable};

/// Pushes the context shared by single-table statements.
fn enter_single_table<'a, 'w>(
    w: &'a mut SqlWriter<'w>,
    table: &TableRef,
    correlate: bool,
) -> ContextGuard<'a, 'w> {
    let mut guard = w.scoped();
    guard.context_mut().use_table_aliases = false;
    if correlate {
        guard.context_mut().enter_query(IndexSet::from([table.clone()]));
    }
    guard
}

fn render_where(where_clause: &ComboCondition, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
    if where_clause.is_empty() {
        return Ok(());
    }
    w.append(" WHERE ")?;
    where_clause.render_ungrouped(w)
}

enum InsertSource {
    DefaultValues,
    Values(Vec<Vec<BoxedNode>>),
    Select(SelectQuery),
}

/// `INSERT INTO table (columns) VALUES ... | SELECT ...`.
pub struct InsertQuery {
    table: TableRef,
    columns: Vec<DbColumn>,
    source: InsertSource,
}

impl InsertQuery {
    /// Inserts into `table`; without rows it inserts DEFAULT VALUES.
    #[must_use]
    pub fn into_table(table: &TableRef) -> Self {
        Self {
            table: table.clone(),
            columns: Vec::new(),
            source: InsertSource::DefaultValues,
        }
    }

    /// Adds a target column.
    #[must_use]
    pub fn column(mut self, column: &DbColumn) -> Self {
        self.columns.push(column.clone());
        self
    }

    /// Adds a row of values, one per target column.
    #[must_use]
    pub fn values(mut self, row: Vec<BoxedNode>) -> Self {
        match &mut self.source {
            InsertSource::Values(rows) => rows.push(row),
            source => *source = InsertSource::Values(vec![row]),
        }
        self
    }

    /// Inserts the rows produced by `select`.
    #[must_use]
    pub fn select(mut self, select: SelectQuery) -> Self {
        self.source = InsertSource::Select(select);
        self
    }
}

impl SqlNode for InsertQuery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        let mut w = enter_single_table(w, &self.table, false);
        w.append("INSERT INTO ")?;
        self.table.render(&mut w)?;
        if !self.columns.is_empty() {
            w.append(" (")?;
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    w.append(", ")?;
                }
                column.render(&mut w)?;
            }
            w.append(")")?;
        }
        match &self.source {
            InsertSource::DefaultValues => w.append(" DEFAULT VALUES"),
            InsertSource::Values(rows) => {
                w.append(" VALUES ")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        w.append(", ")?;
                    }
                    w.append("(")?;
                    for (j, value) in row.iter().enumerate() {
                        if j > 0 {
                            w.append(", ")?;
                        }
                        value.render(&mut w)?;
                    }
                    w.append(")")?;
                }
                Ok(())
            }
            InsertSource::Select(select) => {
                w.append(" ")?;
                select.render(&mut w)
            }
        }
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        if let InsertSource::Select(select) = &self.source {
            collector.nested(|inner| select.collect(inner));
        }
        collector.add_table(&self.table);
        for column in &self.columns {
            column.collect(collector);
        }
        if let InsertSource::Values(rows) = &self.source {
            for value in rows.iter().flatten() {
                value.collect(collector);
            }
        }
        collector.add_verifiable(self);
    }
}

impl Verifiable for InsertQuery {
    fn verify(&self, scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
        let expected = self.columns.len();
        match &self.source {
            InsertSource::Values(rows) if expected > 0 => {
                if let Some(row) = rows.iter().find(|row| row.len() != expected) {
                    return Err(ValidationError::for_node(
                        format!("INSERT lists {expected} columns but a row has {} values", row.len()),
                        self,
                    ));
                }
            }
            InsertSource::Select(select) if expected > 0 => {
                if let Some(found) = select.column_count().filter(|&n| n != expected) {
                    return Err(ValidationError::for_node(
                        format!("INSERT lists {expected} columns but its SELECT produces {found}"),
                        self,
                    ));
                }
            }
            _ => {}
        }
        verify_column_tables(scope, self)
    }
}

/// `UPDATE table SET column = value, ... [WHERE ...]`.
pub struct UpdateQuery {
    table: TableRef,
    assignments: Vec<(DbColumn, BoxedNode)>,
    where_clause: ComboCondition,
}

impl UpdateQuery {
    /// Updates rows of `table`.
    #[must_use]
    pub fn table(table: &TableRef) -> Self {
        Self {
            table: table.clone(),
            assignments: Vec::new(),
            where_clause: ComboCondition::and(),
        }
    }

    /// Adds `column = value`.
    #[must_use]
    pub fn set(mut self, column: &DbColumn, value: impl IntoNode) -> Self {
        self.assignments.push((column.clone(), value.into_node()));
        self
    }

    /// Adds a WHERE condition, combined with AND.
    #[must_use]
    pub fn where_clause(mut self, condition: impl IntoNode) -> Self {
        self.where_clause.push(condition);
        self
    }
}

impl SqlNode for UpdateQuery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        let mut w = enter_single_table(w, &self.table, true);
        w.append("UPDATE ")?;
        self.table.render(&mut w)?;
        w.append(" SET ")?;
        for (i, (column, value)) in self.assignments.iter().enumerate() {
            if i > 0 {
                w.append(", ")?;
            }
            column.render(&mut w)?;
            w.append(" = ")?;
            value.render(&mut w)?;
        }
        render_where(&self.where_clause, &mut w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_table(&self.table);
        for (column, value) in &self.assignments {
            column.collect(collector);
            value.collect(collector);
        }
        self.where_clause.collect(collector);
        collector.add_verifiable(self);
    }
}

impl Verifiable for UpdateQuery {
    fn verify(&self, scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
        if self.assignments.is_empty() {
            return Err(ValidationError::for_node("UPDATE without assignments", self));
        }
        verify_column_tables(scope, self)
    }
}

/// `DELETE FROM table [WHERE ...]`.
pub struct DeleteQuery {
    table: TableRef,
    where_clause: ComboCondition,
}

impl DeleteQuery {
    /// Deletes rows of `table`.
    #[must_use]
    pub fn from_table(table: &TableRef) -> Self {
        Self {
            table: table.clone(),
            where_clause: ComboCondition::and(),
        }
    }

    /// Adds a WHERE condition, combined with AND.
    #[must_use]
    pub fn where_clause(mut self, condition: impl IntoNode) -> Self {
        self.where_clause.push(condition);
        self
    }

    /// Whether a WHERE clause will be rendered.
    #[must_use]
    pub fn has_where_clause(&self) -> bool {
        !self.where_clause.is_empty()
    }
}

impl SqlNode for DeleteQuery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        let mut w = enter_single_table(w, &self.table, true);
        w.append("DELETE FROM ")?;
        self.table.render(&mut w)?;
        render_where(&self.where_clause, &mut w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_table(&self.table);
        self.where_clause.collect(collector);
        collector.add_verifiable(self);
    }
}

impl Verifiable for DeleteQuery {
    fn verify(&self, scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
        verify_column_tables(scope, self)
    }
}
