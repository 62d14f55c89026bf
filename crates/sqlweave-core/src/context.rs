//! Inheritable render context.
//!
//! Every statement pushes a copy of the current context before it renders
//! its body and restores the previous one afterwards. Nested clauses are
//! free to flip flags on their copy: siblings never see each other's
//! changes, but all of them start from the settings of their parent.

use std::sync::Arc;

use indexmap::IndexSet;

use crate::schema::TableRef;

/// Presentation flags and the enclosing-query record for one level of
/// statement nesting.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Qualify columns with table aliases and declare aliases in FROM.
    pub use_table_aliases: bool,
    /// Render column and table constraints in DDL.
    pub use_table_constraints: bool,
    enclosing: Option<Arc<EnclosingQuery>>,
    depth: usize,
}

impl RenderContext {
    /// Creates the outermost context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            use_table_aliases: true,
            use_table_constraints: true,
            enclosing: None,
            depth: 0,
        }
    }

    /// Nesting depth; the outermost context is at depth 0.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) const fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// The innermost enclosing query, if any.
    #[must_use]
    pub fn enclosing(&self) -> Option<&EnclosingQuery> {
        self.enclosing.as_deref()
    }

    /// Records that the body rendered under this context belongs to a query
    /// whose FROM clause introduces `tables`.
    pub fn enter_query(&mut self, tables: IndexSet<TableRef>) {
        let parent = self.enclosing.take();
        self.enclosing = Some(Arc::new(EnclosingQuery { tables, parent }));
    }

    /// Returns true if `table` is introduced by the FROM clause of any
    /// enclosing query.
    #[must_use]
    pub fn is_visible_from_enclosing(&self, table: &TableRef) -> bool {
        let mut current = self.enclosing();
        while let Some(query) = current {
            if query.tables.contains(table) {
                return true;
            }
            current = query.parent();
        }
        false
    }

    /// Returns true if `table` comes from a query enclosing the innermost
    /// one rather than from the innermost query itself.
    ///
    /// Columns of such tables are qualified by table name when aliases are
    /// off.
    #[must_use]
    pub fn is_outer_table(&self, table: &TableRef) -> bool {
        let Some(current) = self.enclosing() else {
            return false;
        };
        if current.tables.contains(table) {
            return false;
        }
        let mut outer = current.parent();
        while let Some(query) = outer {
            if query.tables.contains(table) {
                return true;
            }
            outer = query.parent();
        }
        false
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning record of an enclosing query: the tables its FROM clause
/// introduces, chained to its own enclosing query.
#[derive(Debug)]
pub struct EnclosingQuery {
    tables: IndexSet<TableRef>,
    parent: Option<Arc<EnclosingQuery>>,
}

impl EnclosingQuery {
    /// Tables introduced by this query.
    #[must_use]
    pub const fn tables(&self) -> &IndexSet<TableRef> {
        &self.tables
    }

    /// The query enclosing this one.
    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.parent.as_deref()
    }
}

/// Proof of a push, handed back to [`SqlWriter::pop_context`].
///
/// [`SqlWriter::pop_context`]: crate::sink::SqlWriter::pop_context
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pushed context must be popped"]
pub struct ContextToken {
    pub(crate) depth: usize,
}
