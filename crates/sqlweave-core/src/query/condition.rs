//! WHERE / HAVING / ON conditions.

use crate::error::RenderError;
use crate::node::{live_count, render_group, BoxedNode, IntoNode, SqlNode};
use crate::sink::SqlWriter;
use crate::validate::Collector;

/// `left op right`.
pub struct BinaryCondition {
    left: BoxedNode,
    op: &'static str,
    right: BoxedNode,
}

impl BinaryCondition {
    /// Creates `left op right` with an arbitrary operator.
    #[must_use]
    pub fn new(left: impl IntoNode, op: &'static str, right: impl IntoNode) -> Self {
        Self {
            left: left.into_node(),
            op,
            right: right.into_node(),
        }
    }

    /// `left = right`.
    #[must_use]
    pub fn eq(left: impl IntoNode, right: impl IntoNode) -> Self {
        Self::new(left, "=", right)
    }

    /// `left <> right`.
    #[must_use]
    pub fn not_eq(left: impl IntoNode, right: impl IntoNode) -> Self {
        Self::new(left, "<>", right)
    }

    /// `left < right`.
    #[must_use]
    pub fn lt(left: impl IntoNode, right: impl IntoNode) -> Self {
        Self::new(left, "<", right)
    }

    /// `left <= right`.
    #[must_use]
    pub fn lt_eq(left: impl IntoNode, right: impl IntoNode) -> Self {
        Self::new(left, "<=", right)
    }

    /// `left > right`.
    #[must_use]
    pub fn gt(left: impl IntoNode, right: impl IntoNode) -> Self {
        Self::new(left, ">", right)
    }

    /// `left >= right`.
    #[must_use]
    pub fn gt_eq(left: impl IntoNode, right: impl IntoNode) -> Self {
        Self::new(left, ">=", right)
    }

    /// `left LIKE pattern`.
    #[must_use]
    pub fn like(left: impl IntoNode, pattern: impl IntoNode) -> Self {
        Self::new(left, "LIKE", pattern)
    }

    /// `left NOT LIKE pattern`.
    #[must_use]
    pub fn not_like(left: impl IntoNode, pattern: impl IntoNode) -> Self {
        Self::new(left, "NOT LIKE", pattern)
    }
}

impl SqlNode for BinaryCondition {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        self.left.render(w)?;
        w.append(" ")?;
        w.append(self.op)?;
        w.append(" ")?;
        self.right.render(w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        self.left.collect(collector);
        self.right.collect(collector);
    }
}

/// Conditions joined by AND or OR.
///
/// Empty children are left out. With no child left the whole group is
/// empty and renders nothing; a single child renders bare.
pub struct ComboCondition {
    op: &'static str,
    items: Vec<BoxedNode>,
}

impl ComboCondition {
    /// An empty AND group.
    #[must_use]
    pub const fn and() -> Self {
        Self {
            op: " AND ",
            items: Vec::new(),
        }
    }

    /// An empty OR group.
    #[must_use]
    pub const fn or() -> Self {
        Self {
            op: " OR ",
            items: Vec::new(),
        }
    }

    /// Adds a condition.
    #[must_use]
    pub fn with(mut self, condition: impl IntoNode) -> Self {
        self.push(condition);
        self
    }

    /// Adds a condition in place.
    pub fn push(&mut self, condition: impl IntoNode) {
        self.items.push(condition.into_node());
    }

    /// Number of children that will be rendered.
    #[must_use]
    pub fn live_len(&self) -> usize {
        live_count(&self.items)
    }

    /// Renders the live children without the surrounding parentheses, as
    /// the top level of a WHERE or HAVING clause.
    pub(crate) fn render_ungrouped(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        let live = self.items.iter().filter(|item| !item.is_empty());
        for (i, item) in live.enumerate() {
            if i > 0 {
                w.append(self.op)?;
            }
            item.render(w)?;
        }
        Ok(())
    }
}

impl SqlNode for ComboCondition {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        render_group(&self.items, self.op, w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        for item in &self.items {
            item.collect(collector);
        }
    }

    fn is_empty(&self) -> bool {
        self.live_len() == 0
    }

    fn has_parens(&self) -> bool {
        self.live_len() > 1
    }
}

impl Default for ComboCondition {
    fn default() -> Self {
        Self::and()
    }
}

/// Prefix or postfix operator over one operand.
pub struct UnaryCondition {
    prefix: Option<&'static str>,
    operand: BoxedNode,
    postfix: Option<&'static str>,
}

impl UnaryCondition {
    /// `operand IS NULL`.
    #[must_use]
    pub fn is_null(operand: impl IntoNode) -> Self {
        Self::postfix(operand, " IS NULL")
    }

    /// `operand IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(operand: impl IntoNode) -> Self {
        Self::postfix(operand, " IS NOT NULL")
    }

    /// `EXISTS subquery`.
    #[must_use]
    pub fn exists(subquery: impl IntoNode) -> Self {
        Self::prefix("EXISTS ", subquery)
    }

    /// `NOT EXISTS subquery`.
    #[must_use]
    pub fn not_exists(subquery: impl IntoNode) -> Self {
        Self::prefix("NOT EXISTS ", subquery)
    }

    fn prefix(op: &'static str, operand: impl IntoNode) -> Self {
        Self {
            prefix: Some(op),
            operand: operand.into_node(),
            postfix: None,
        }
    }

    fn postfix(operand: impl IntoNode, op: &'static str) -> Self {
        Self {
            prefix: None,
            operand: operand.into_node(),
            postfix: Some(op),
        }
    }
}

impl SqlNode for UnaryCondition {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        if let Some(op) = self.prefix {
            w.append(op)?;
        }
        self.operand.render(w)?;
        if let Some(op) = self.postfix {
            w.append(op)?;
        }
        Ok(())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        self.operand.collect(collector);
    }
}

/// `expr [NOT] IN (v1, v2, ...)` or `expr [NOT] IN (subquery)`.
///
/// An empty value list makes the condition empty.
pub struct InCondition {
    operand: BoxedNode,
    values: Vec<BoxedNode>,
    negated: bool,
}

impl InCondition {
    /// `operand IN (...)`.
    #[must_use]
    pub fn new(operand: impl IntoNode) -> Self {
        Self {
            operand: operand.into_node(),
            values: Vec::new(),
            negated: false,
        }
    }

    /// `operand IN (subquery)`.
    ///
    /// The subquery should already carry its parentheses.
    #[must_use]
    pub fn subquery(operand: impl IntoNode, subquery: impl IntoNode) -> Self {
        Self::new(operand).value(subquery)
    }

    /// Adds a candidate value.
    #[must_use]
    pub fn value(mut self, value: impl IntoNode) -> Self {
        self.values.push(value.into_node());
        self
    }

    /// Turns the condition into `NOT IN`.
    #[must_use]
    pub const fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

impl SqlNode for InCondition {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        self.operand.render(w)?;
        w.append(if self.negated { " NOT IN " } else { " IN " })?;
        if let [single] = self.values.as_slice() {
            if single.has_parens() {
                return single.render(w);
            }
        }
        w.append("(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                w.append(", ")?;
            }
            value.render(w)?;
        }
        w.append(")")
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        self.operand.collect(collector);
        for value in &self.values {
            value.collect(collector);
        }
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `NOT condition`. Empty when the negated condition is.
pub struct NotCondition(BoxedNode);

impl NotCondition {
    /// Negates `condition`.
    #[must_use]
    pub fn new(condition: impl IntoNode) -> Self {
        Self(condition.into_node())
    }
}

impl SqlNode for NotCondition {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("NOT ")?;
        super::render_wrapped(&*self.0, w)
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        self.0.collect(collector);
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::render;
    use crate::query::{CustomSql, Empty, FunctionCall, Subquery, Value};

    fn sql(text: &str) -> CustomSql {
        CustomSql::new(text)
    }

    #[test]
    fn test_binary() {
        let cond = BinaryCondition::gt_eq(sql("total"), Value::new(10));
        assert_eq!(render(&cond).unwrap(), "total >= 10");
        let cond = BinaryCondition::not_like(sql("name"), Value::new("a%"));
        assert_eq!(render(&cond).unwrap(), "name NOT LIKE 'a%'");
    }

    #[test]
    fn test_combo_elision() {
        let all_empty = ComboCondition::and().with(Empty).with(ComboCondition::or());
        assert!(SqlNode::is_empty(&all_empty));
        assert_eq!(render(&all_empty).unwrap(), "");

        let single = ComboCondition::and().with(Empty).with(sql("a = 1"));
        assert_eq!(render(&single).unwrap(), "a = 1");
        assert!(!single.has_parens());

        let nested = ComboCondition::or()
            .with(sql("a = 1"))
            .with(ComboCondition::and().with(sql("b = 2")).with(sql("c = 3")));
        assert_eq!(render(&nested).unwrap(), "(a = 1 OR (b = 2 AND c = 3))");
    }

    #[test]
    fn test_unary_and_not() {
        assert_eq!(
            render(&UnaryCondition::is_not_null(sql("email"))).unwrap(),
            "email IS NOT NULL"
        );
        let not = NotCondition::new(ComboCondition::and().with(sql("a")).with(sql("b")));
        assert_eq!(render(&not).unwrap(), "NOT (a AND b)");
        let not = NotCondition::new(sql("a = 1"));
        assert_eq!(render(&not).unwrap(), "NOT (a = 1)");
        assert!(SqlNode::is_empty(&NotCondition::new(Empty)));
    }

    #[test]
    fn test_in_list() {
        let cond = InCondition::new(sql("id")).value(Value::new(1)).value(Value::new(2));
        assert_eq!(render(&cond).unwrap(), "id IN (1, 2)");
        let cond = InCondition::new(sql("id")).value(Value::new(3)).negate();
        assert_eq!(render(&cond).unwrap(), "id NOT IN (3)");
        assert!(SqlNode::is_empty(&InCondition::new(sql("id"))));
    }

    #[test]
    fn test_in_list_with_single_function() {
        let cond = InCondition::new(sql("id")).value(FunctionCall::new("abs").arg(Value::new(-1)));
        assert_eq!(render(&cond).unwrap(), "id IN (abs(-1))");
        let cond = InCondition::subquery(sql("id"), Subquery::new(sql("SELECT 1")));
        assert_eq!(render(&cond).unwrap(), "id IN (SELECT 1)");
    }
}
