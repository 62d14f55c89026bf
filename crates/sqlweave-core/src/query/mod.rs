//! Clause catalog.
//!
//! Leaf expressions, conditions and statements built on the [`SqlNode`]
//! contract. Statements push their own render context and register their
//! own checks; the leaves only render and report what they reference.

mod case;
mod condition;
mod ddl;
mod dml;
mod select;
mod set_op;

pub use case::CaseStatement;
pub use condition::{BinaryCondition, ComboCondition, InCondition, NotCondition, UnaryCondition};
pub use ddl::{CreateTableQuery, CreateViewQuery, DropQuery, DropTarget};
pub use dml::{DeleteQuery, InsertQuery, UpdateQuery};
pub use select::{JoinType, Limit, OrderDirection, SelectQuery};
pub use set_op::{SetBranch, SetOperation, SetOperationQuery};

use crate::error::RenderError;
use crate::node::{BoxedNode, IntoNode, SqlNode};
use crate::schema::TableRef;
use crate::sink::SqlWriter;
use crate::validate::Collector;
use crate::value::{SqlValue, ToSqlValue};

/// Raw SQL text, rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSql(String);

impl CustomSql {
    /// Wraps `sql`.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// The wrapped text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SqlNode for CustomSql {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append(&self.0)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A node that renders nothing and is always left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Empty;

impl SqlNode for Empty {
    fn render(&self, _w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    fn is_empty(&self) -> bool {
        true
    }
}

/// An inline literal.
///
/// Use a placeholder instead for anything user supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct Value(SqlValue);

impl Value {
    /// Creates a literal.
    #[must_use]
    pub fn new<T: ToSqlValue>(value: T) -> Self {
        Self(value.to_sql_value())
    }

    /// The literal value.
    #[must_use]
    pub const fn value(&self) -> &SqlValue {
        &self.0
    }
}

impl SqlNode for Value {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append(&self.0.to_sql_inline())
    }
}

/// `name(arg, ...)`.
pub struct FunctionCall {
    name: String,
    args: Vec<BoxedNode>,
}

impl FunctionCall {
    /// Creates a call without arguments.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            args: Vec::new(),
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl IntoNode) -> Self {
        self.args.push(arg.into_node());
        self
    }

    /// `COUNT(*)`.
    #[must_use]
    pub fn count_all() -> Self {
        Self::new("COUNT").arg(AllColumns)
    }
}

impl SqlNode for FunctionCall {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append(&self.name)?;
        w.append("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                w.append(", ")?;
            }
            arg.render(w)?;
        }
        w.append(")")
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        for arg in &self.args {
            arg.collect(collector);
        }
    }
}

/// `expr AS alias`.
pub struct Alias {
    node: BoxedNode,
    alias: String,
}

impl Alias {
    /// Names `node` as `alias`.
    #[must_use]
    pub fn new(node: impl IntoNode, alias: &str) -> Self {
        Self {
            node: node.into_node(),
            alias: String::from(alias),
        }
    }
}

impl SqlNode for Alias {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        self.node.render(w)?;
        w.append(" AS ")?;
        w.append(&self.alias)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        self.node.collect(collector);
    }
}

/// `*`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllColumns;

impl SqlNode for AllColumns {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("*")
    }
}

/// `t0.*`, every column of one table.
#[derive(Debug, Clone)]
pub struct TableWildcard(TableRef);

impl TableWildcard {
    /// Selects every column of `table`.
    #[must_use]
    pub fn new(table: &TableRef) -> Self {
        Self(table.clone())
    }
}

impl SqlNode for TableWildcard {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        match self.0.alias() {
            Some(alias) if w.context().use_table_aliases => w.append(alias)?,
            _ => self.0.render_name(w)?,
        }
        w.append(".*")
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_wildcard_table(&self.0);
    }
}

/// A parenthesized nested statement.
///
/// The statement collects in a child scope, so its references do not
/// leak into the statement around it.
pub struct Subquery(BoxedNode);

impl Subquery {
    /// Wraps `statement`.
    #[must_use]
    pub fn new(statement: impl IntoNode) -> Self {
        Self(statement.into_node())
    }
}

impl SqlNode for Subquery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("(")?;
        self.0.render(w)?;
        w.append(")")
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.nested(|inner| self.0.collect(inner));
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn has_parens(&self) -> bool {
        true
    }
}

/// Writes `node`, parenthesized unless it already carries parentheses.
fn render_wrapped(node: &dyn SqlNode, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
    if node.has_parens() {
        return node.render(w);
    }
    w.append("(")?;
    node.render(w)?;
    w.append(")")
}
