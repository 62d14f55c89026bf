//! The self-rendering node contract.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::RenderContext;
use crate::error::RenderError;
use crate::options::RenderOptions;
use crate::sink::SqlWriter;
use crate::validate::Collector;

/// A unit of the SQL syntax tree.
///
/// Nodes render themselves into a [`SqlWriter`] and feed the tables,
/// columns and self-checks they reference into a [`Collector`].
pub trait SqlNode {
    /// Appends this node's SQL text.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] for programmer faults; the output written
    /// so far must then be discarded.
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError>;

    /// Registers referenced tables, columns and checks, then recurses.
    fn collect<'a>(&'a self, _collector: &mut Collector<'a>) {}

    /// Vacuous nodes are left out by the clause containing them.
    fn is_empty(&self) -> bool {
        false
    }

    /// Whether the rendered text is already wrapped in parentheses.
    fn has_parens(&self) -> bool {
        false
    }
}

/// Boxed node as stored by composite clauses.
pub type BoxedNode = Box<dyn SqlNode + Send + Sync>;

/// Conversion into a [`BoxedNode`].
pub trait IntoNode {
    /// Boxes the node.
    fn into_node(self) -> BoxedNode;
}

impl<T: SqlNode + Send + Sync + 'static> IntoNode for T {
    fn into_node(self) -> BoxedNode {
        Box::new(self)
    }
}

impl<T: SqlNode + ?Sized> SqlNode for Box<T> {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        (**self).render(w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        (**self).collect(collector);
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn has_parens(&self) -> bool {
        (**self).has_parens()
    }
}

impl<T: SqlNode + ?Sized> SqlNode for Arc<T> {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        (**self).render(w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        (**self).collect(collector);
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn has_parens(&self) -> bool {
        (**self).has_parens()
    }
}

impl<T: SqlNode + ?Sized> SqlNode for &T {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        (**self).render(w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        (**self).collect(collector);
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn has_parens(&self) -> bool {
        (**self).has_parens()
    }
}

/// Ordered children joined by a delimiter.
#[derive(Debug)]
pub struct NodeList<T> {
    items: Vec<T>,
    delimiter: &'static str,
}

impl<T: SqlNode> NodeList<T> {
    /// Creates an empty list joined by `delimiter`.
    #[must_use]
    pub const fn new(delimiter: &'static str) -> Self {
        Self {
            items: Vec::new(),
            delimiter,
        }
    }

    /// Creates an empty comma separated list.
    #[must_use]
    pub const fn comma() -> Self {
        Self::new(", ")
    }

    /// Appends a child.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the list has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if every child is empty (or there is none).
    #[must_use]
    pub fn is_all_empty(&self) -> bool {
        self.items.iter().all(SqlNode::is_empty)
    }

    /// Iterates over the children.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Renders the non-empty children as a group.
    ///
    /// # Errors
    ///
    /// Propagates child faults.
    pub fn render_group(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        render_group(&self.items, self.delimiter, w)
    }
}

impl<T> FromIterator<T> for NodeList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            delimiter: ", ",
        }
    }
}

impl<T: SqlNode> SqlNode for NodeList<T> {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                w.append(self.delimiter)?;
            }
            item.render(w)?;
        }
        Ok(())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        for item in &self.items {
            item.collect(collector);
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Renders the non-empty `items` joined by `delimiter`.
///
/// Nothing is written when no child survives, a single survivor renders
/// bare, and several survivors are wrapped in parentheses.
///
/// # Errors
///
/// Propagates child faults.
pub fn render_group<T: SqlNode>(
    items: &[T],
    delimiter: &str,
    w: &mut SqlWriter<'_>,
) -> Result<(), RenderError> {
    let live: Vec<&T> = items.iter().filter(|item| !item.is_empty()).collect();
    match live.as_slice() {
        [] => Ok(()),
        [single] => single.render(w),
        many => {
            w.append("(")?;
            for (i, item) in many.iter().enumerate() {
                if i > 0 {
                    w.append(delimiter)?;
                }
                item.render(w)?;
            }
            w.append(")")
        }
    }
}

/// Counts the children that survive empty-filtering.
pub fn live_count<T: SqlNode>(items: &[T]) -> usize {
    items.iter().filter(|item| !item.is_empty()).count()
}

/// Renders `node` under the default options.
///
/// # Errors
///
/// Returns the first [`RenderError`] raised by the tree.
pub fn render(node: &dyn SqlNode) -> Result<String, RenderError> {
    render_with(node, &RenderOptions::default())
}

/// Renders `node` starting from the context described by `options`.
///
/// # Errors
///
/// Returns the first [`RenderError`] raised by the tree.
pub fn render_with(node: &dyn SqlNode, options: &RenderOptions) -> Result<String, RenderError> {
    render_in(node, options.to_context())
}

/// Renders `node` starting from `context`.
///
/// # Errors
///
/// Returns the first [`RenderError`] raised by the tree.
pub fn render_in(node: &dyn SqlNode, context: RenderContext) -> Result<String, RenderError> {
    let mut out = String::new();
    let mut w = SqlWriter::with_context(&mut out, context);
    node.render(&mut w)?;
    debug!(len = out.len(), "rendered statement");
    Ok(out)
}

/// Renders without recording tracker positions, swallowing any fault.
pub(crate) fn render_detached(node: &dyn SqlNode) -> Option<String> {
    let mut out = String::new();
    let mut w = SqlWriter::detached(&mut out);
    node.render(&mut w).ok()?;
    Some(out)
}

/// [`fmt::Display`] adapter for any node.
///
/// Rendering faults surface as [`fmt::Error`]; use [`render`] to see them.
pub struct SqlDisplay<'a>(pub &'a dyn SqlNode);

impl fmt::Display for SqlDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = SqlWriter::new(f);
        self.0.render(&mut w).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{CustomSql, Empty};

    #[test]
    fn test_list_joins_with_delimiter() {
        let list: NodeList<CustomSql> = ["a", "b", "c"].into_iter().map(CustomSql::new).collect();
        assert_eq!(render(&list).unwrap(), "a, b, c");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_empty_list() {
        let list: NodeList<CustomSql> = NodeList::new(" AND ");
        assert!(SqlNode::is_empty(&list));
        assert!(list.is_all_empty());
        assert_eq!(render(&list).unwrap(), "");
    }

    #[test]
    fn test_group_elides_empty_children() {
        let items: Vec<BoxedNode> = vec![Empty.into_node(), Empty.into_node()];
        let mut out = String::new();
        render_group(&items, " AND ", &mut SqlWriter::new(&mut out)).unwrap();
        assert_eq!(out, "");

        let items: Vec<BoxedNode> = vec![Empty.into_node(), CustomSql::new("x = 1").into_node()];
        let mut out = String::new();
        render_group(&items, " AND ", &mut SqlWriter::new(&mut out)).unwrap();
        assert_eq!(out, "x = 1");

        let items: Vec<BoxedNode> = vec![
            CustomSql::new("x = 1").into_node(),
            Empty.into_node(),
            CustomSql::new("y = 2").into_node(),
        ];
        let mut out = String::new();
        render_group(&items, " AND ", &mut SqlWriter::new(&mut out)).unwrap();
        assert_eq!(out, "(x = 1 AND y = 2)");
        assert_eq!(live_count(&items), 2);
    }

    #[test]
    fn test_display_adapter() {
        let node = CustomSql::new("SELECT 1");
        assert_eq!(SqlDisplay(&node).to_string(), "SELECT 1");
    }
}
