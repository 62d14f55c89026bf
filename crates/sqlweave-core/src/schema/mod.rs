//! Database metadata model.
//!
//! A plain acyclic model of schemas, tables, columns, constraints and
//! joins. The engine only reads it: a [`TableRef`] is the identity of a
//! table, a [`DbColumn`] knows its owning table. Identity is by shared
//! pointer, so two tables with the same name are still distinct.

mod column;
mod constraint;
mod join;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use column::{ColumnDef, DbColumn, DefaultValue};
pub use constraint::{ConstraintKind, DbConstraint, ForeignKeyAction, ForeignKeyRef};
pub use join::DbJoin;

use crate::error::RenderError;
use crate::node::SqlNode;
use crate::sink::SqlWriter;
use crate::validate::Collector;

/// Shared identity of a table.
#[derive(Clone)]
pub struct TableRef(Arc<TableInfo>);

struct TableInfo {
    schema: Option<String>,
    name: String,
    alias: Option<String>,
}

impl TableRef {
    /// Creates a table identity.
    #[must_use]
    pub fn new(schema: Option<&str>, name: &str, alias: Option<&str>) -> Self {
        Self(Arc::new(TableInfo {
            schema: schema.map(String::from),
            name: String::from(name),
            alias: alias.map(String::from),
        }))
    }

    /// The unqualified table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The table alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.0.alias.as_deref()
    }

    /// The schema name, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.0.schema.as_deref()
    }

    /// `schema.name`, or just the name.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.schema() {
            Some(schema) => format!("{schema}.{}", self.name()),
            None => String::from(self.name()),
        }
    }

    /// Writes the qualified name, without alias.
    pub(crate) fn render_name(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        if let Some(schema) = self.schema() {
            w.append(schema)?;
            w.append(".")?;
        }
        w.append(self.name())
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TableRef {}

impl Hash for TableRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRef")
            .field("name", &self.qualified_name())
            .field("alias", &self.alias())
            .finish()
    }
}

/// Renders the table as it appears in a FROM clause.
impl SqlNode for TableRef {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        self.render_name(w)?;
        if w.context().use_table_aliases {
            if let Some(alias) = self.alias() {
                w.append(" ")?;
                w.append(alias)?;
            }
        }
        Ok(())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_table(self);
    }
}

/// Root of the model. Hands out sequential table aliases (`t0`, `t1`, ...).
#[derive(Debug)]
pub struct DbSpec {
    next_alias: usize,
    use_aliases: bool,
}

impl DbSpec {
    /// Creates a spec that aliases every table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_alias: 0,
            use_aliases: true,
        }
    }

    /// Creates a spec whose tables carry no alias.
    #[must_use]
    pub const fn without_aliases() -> Self {
        Self {
            next_alias: 0,
            use_aliases: false,
        }
    }

    /// Adds a table outside any named schema.
    pub fn add_table(&mut self, name: &str) -> DbTable {
        self.create_table(None, name)
    }

    /// Opens a named schema.
    pub fn schema(&mut self, name: &str) -> DbSchema<'_> {
        DbSchema {
            spec: self,
            name: String::from(name),
        }
    }

    fn next_alias(&mut self) -> Option<String> {
        if !self.use_aliases {
            return None;
        }
        let alias = format!("t{}", self.next_alias);
        self.next_alias += 1;
        Some(alias)
    }

    fn create_table(&mut self, schema: Option<&str>, name: &str) -> DbTable {
        let alias = self.next_alias();
        DbTable {
            table: TableRef::new(schema, name, alias.as_deref()),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }
}

impl Default for DbSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// A named schema; tables added through it are schema-qualified.
#[derive(Debug)]
pub struct DbSchema<'s> {
    spec: &'s mut DbSpec,
    name: String,
}

impl DbSchema<'_> {
    /// The schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a table to this schema.
    pub fn add_table(&mut self, name: &str) -> DbTable {
        let schema = self.name.clone();
        self.spec.create_table(Some(&schema), name)
    }
}

/// A table with its ordered columns and table-level constraints.
#[derive(Debug, Clone)]
pub struct DbTable {
    table: TableRef,
    columns: Vec<DbColumn>,
    constraints: Vec<DbConstraint>,
}

impl DbTable {
    /// The table identity.
    #[must_use]
    pub const fn table_ref(&self) -> &TableRef {
        &self.table
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// The table alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.table.alias()
    }

    /// Adds a column with a type name and returns it.
    pub fn add_column(&mut self, name: &str, type_name: &str) -> DbColumn {
        self.add_column_def(ColumnDef::new(name).type_name(type_name))
    }

    /// Adds a fully described column and returns it.
    pub fn add_column_def(&mut self, def: ColumnDef) -> DbColumn {
        let column = def.build(self.table.clone());
        self.columns.push(column.clone());
        column
    }

    /// Adds a table-level constraint.
    pub fn add_constraint(&mut self, constraint: DbConstraint) {
        self.constraints.push(constraint);
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&DbColumn> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[DbColumn] {
        &self.columns
    }

    /// Table-level constraints in declaration order.
    #[must_use]
    pub fn constraints(&self) -> &[DbConstraint] {
        &self.constraints
    }
}

impl SqlNode for DbTable {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        self.table.render(w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_table(&self.table);
    }
}
