//! Column metadata and its builder.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::constraint::{ConstraintKind, DbConstraint, ForeignKeyAction, ForeignKeyRef};
use super::TableRef;
use crate::error::RenderError;
use crate::node::SqlNode;
use crate::sink::SqlWriter;
use crate::validate::Collector;

/// Default value of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., `CURRENT_TIMESTAMP`).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(true) => String::from("TRUE"),
            Self::Boolean(false) => String::from("FALSE"),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// A column of a [`DbTable`](super::DbTable).
///
/// Cheap to clone; clones share identity.
#[derive(Clone)]
pub struct DbColumn(Arc<ColumnInfo>);

struct ColumnInfo {
    table: TableRef,
    name: String,
    type_name: Option<String>,
    type_length: Option<u32>,
    qualifiers: Vec<String>,
    default: Option<DefaultValue>,
    constraints: Vec<DbConstraint>,
}

impl DbColumn {
    /// The owning table.
    #[must_use]
    pub fn table(&self) -> &TableRef {
        &self.0.table
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The declared type name.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.0.type_name.as_deref()
    }

    /// The declared type length, e.g. 255 for `VARCHAR(255)`.
    #[must_use]
    pub fn type_length(&self) -> Option<u32> {
        self.0.type_length
    }

    /// Extra type qualifiers in declaration order.
    #[must_use]
    pub fn qualifiers(&self) -> &[String] {
        &self.0.qualifiers
    }

    /// The default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.0.default.as_ref()
    }

    /// Column-level constraints in declaration order.
    #[must_use]
    pub fn constraints(&self) -> &[DbConstraint] {
        &self.0.constraints
    }
}

impl PartialEq for DbColumn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DbColumn {}

impl Hash for DbColumn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for DbColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbColumn")
            .field("table", &self.table().name())
            .field("name", &self.name())
            .finish()
    }
}

/// Renders the column reference, qualified by the table alias when
/// aliases are in use.
impl SqlNode for DbColumn {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        let table = self.table();
        match table.alias() {
            Some(alias) if w.context().use_table_aliases => {
                w.append(alias)?;
                w.append(".")?;
            }
            _ if w.context().is_outer_table(table) => {
                table.render_name(w)?;
                w.append(".")?;
            }
            _ => {}
        }
        w.append(self.name())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_column(self);
    }
}

/// Builder describing a column before it is added to a table.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    name: String,
    type_name: Option<String>,
    type_length: Option<u32>,
    qualifiers: Vec<String>,
    default: Option<DefaultValue>,
    constraints: Vec<DbConstraint>,
}

impl ColumnDef {
    /// Starts a column definition.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            type_name: None,
            type_length: None,
            qualifiers: Vec::new(),
            default: None,
            constraints: Vec::new(),
        }
    }

    /// Sets the type name.
    #[must_use]
    pub fn type_name(mut self, type_name: &str) -> Self {
        self.type_name = Some(String::from(type_name));
        self
    }

    /// Sets the type length.
    #[must_use]
    pub const fn type_length(mut self, length: u32) -> Self {
        self.type_length = Some(length);
        self
    }

    /// Adds a type qualifier rendered after the type.
    #[must_use]
    pub fn qualifier(mut self, qualifier: &str) -> Self {
        self.qualifiers.push(String::from(qualifier));
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Adds a NOT NULL constraint.
    #[must_use]
    pub fn not_null(self) -> Self {
        self.constraint(DbConstraint::new(ConstraintKind::NotNull))
    }

    /// Adds a UNIQUE constraint.
    #[must_use]
    pub fn unique(self) -> Self {
        self.constraint(DbConstraint::new(ConstraintKind::Unique))
    }

    /// Adds a PRIMARY KEY constraint.
    #[must_use]
    pub fn primary_key(self) -> Self {
        self.constraint(DbConstraint::new(ConstraintKind::PrimaryKey))
    }

    /// Adds a REFERENCES constraint.
    #[must_use]
    pub fn references(self, column: &DbColumn) -> Self {
        self.constraint(DbConstraint::foreign_key(
            Vec::new(),
            ForeignKeyRef::new(column.table(), &[column.name()]),
        ))
    }

    /// Adds a REFERENCES constraint with an ON DELETE action.
    #[must_use]
    pub fn references_on_delete(self, column: &DbColumn, action: ForeignKeyAction) -> Self {
        self.constraint(DbConstraint::foreign_key(
            Vec::new(),
            ForeignKeyRef::new(column.table(), &[column.name()]).on_delete(action),
        ))
    }

    /// Adds an arbitrary column-level constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: DbConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub(super) fn build(self, table: TableRef) -> DbColumn {
        DbColumn(Arc::new(ColumnInfo {
            table,
            name: self.name,
            type_name: self.type_name,
            type_length: self.type_length,
            qualifiers: self.qualifiers,
            default: self.default,
            constraints: self.constraints,
        }))
    }
}
