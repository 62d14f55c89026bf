//! CREATE TABLE, CREATE VIEW and DROP.

use super::select::SelectQuery;
use crate::error::{RenderError, ValidationError};
use crate::node::SqlNode;
use crate::schema::{DbColumn, DbConstraint, DbTable, TableRef};
use crate::sink::SqlWriter;
use crate::validate::{Collector, ScopeChain, Verifiable};

/// `CREATE TABLE` for a described table.
///
/// Column and table constraints are rendered only while the context has
/// `use_table_constraints` set.
pub struct CreateTableQuery {
    table: TableRef,
    columns: Vec<DbColumn>,
    constraints: Vec<DbConstraint>,
    if_not_exists: bool,
}

impl CreateTableQuery {
    /// Creates the statement for `table` as currently described.
    #[must_use]
    pub fn new(table: &DbTable) -> Self {
        Self {
            table: table.table_ref().clone(),
            columns: table.columns().to_vec(),
            constraints: table.constraints().to_vec(),
            if_not_exists: false,
        }
    }

    /// Adds `IF NOT EXISTS`.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    fn render_column(column: &DbColumn, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append(column.name())?;
        if let Some(type_name) = column.type_name() {
            w.append(" ")?;
            w.append(type_name)?;
            if let Some(length) = column.type_length() {
                w.append(&format!("({length})"))?;
            }
        }
        for qualifier in column.qualifiers() {
            w.append(" ")?;
            w.append(qualifier)?;
        }
        if let Some(default) = column.default_value() {
            w.append(" DEFAULT ")?;
            w.append(&default.to_sql())?;
        }
        if w.context().use_table_constraints {
            for constraint in column.constraints() {
                w.append(" ")?;
                constraint.render_column_level(w)?;
            }
        }
        Ok(())
    }
}

impl SqlNode for CreateTableQuery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        let mut w = w.scoped();
        w.context_mut().use_table_aliases = false;

        w.append("CREATE TABLE ")?;
        if self.if_not_exists {
            w.append("IF NOT EXISTS ")?;
        }
        self.table.render(&mut w)?;
        w.append(" (")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                w.append(", ")?;
            }
            Self::render_column(column, &mut w)?;
        }
        if w.context().use_table_constraints {
            for constraint in &self.constraints {
                w.append(", ")?;
                constraint.render_table_level(&mut w)?;
            }
        }
        w.append(")")
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_table(&self.table);
    }
}

/// `CREATE VIEW name [(columns)] AS select`.
pub struct CreateViewQuery {
    name: String,
    columns: Vec<String>,
    select: SelectQuery,
}

impl CreateViewQuery {
    /// Creates a view over `select`.
    #[must_use]
    pub fn new(name: &str, select: SelectQuery) -> Self {
        Self {
            name: String::from(name),
            columns: Vec::new(),
            select,
        }
    }

    /// Names the view columns.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| String::from(*c)).collect();
        self
    }
}

impl SqlNode for CreateViewQuery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("CREATE VIEW ")?;
        w.append(&self.name)?;
        if !self.columns.is_empty() {
            w.append(" (")?;
            w.append(&self.columns.join(", "))?;
            w.append(")")?;
        }
        w.append(" AS ")?;
        self.select.render(w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.nested(|inner| self.select.collect(inner));
        collector.add_verifiable(self);
    }
}

impl Verifiable for CreateViewQuery {
    fn verify(&self, _scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
        if self.columns.is_empty() {
            return Ok(());
        }
        match self.select.column_count() {
            Some(found) if found != self.columns.len() => Err(ValidationError::for_node(
                format!(
                    "View {} names {} columns but its SELECT produces {found}",
                    self.name,
                    self.columns.len()
                ),
                self,
            )),
            _ => Ok(()),
        }
    }
}

/// Kind of object dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A table.
    Table,
    /// A view.
    View,
}

impl DropTarget {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::View => "VIEW",
        }
    }
}

/// `DROP TABLE|VIEW [IF EXISTS] name`.
#[derive(Debug, Clone)]
pub struct DropQuery {
    target: DropTarget,
    name: String,
    if_exists: bool,
}

impl DropQuery {
    /// Drops `table`.
    #[must_use]
    pub fn table(table: &TableRef) -> Self {
        Self {
            target: DropTarget::Table,
            name: table.qualified_name(),
            if_exists: false,
        }
    }

    /// Drops the view called `name`.
    #[must_use]
    pub fn view(name: &str) -> Self {
        Self {
            target: DropTarget::View,
            name: String::from(name),
            if_exists: false,
        }
    }

    /// Adds `IF EXISTS`.
    #[must_use]
    pub const fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

impl SqlNode for DropQuery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("DROP ")?;
        w.append(self.target.as_str())?;
        if self.if_exists {
            w.append(" IF EXISTS")?;
        }
        w.append(" ")?;
        w.append(&self.name)
    }
}
