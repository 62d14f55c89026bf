//! SELECT statements.

use indexmap::IndexSet;

use super::condition::ComboCondition;
use super::{AllColumns, TableWildcard};
use crate::context::RenderContext;
use crate::error::{RenderError, ValidationError};
use crate::join::{infer_from_tables, verify_join_chain, JoinLink};
use crate::node::{BoxedNode, IntoNode, SqlNode};
use crate::schema::{DbJoin, TableRef};
use crate::sink::SqlWriter;
use crate::validate::{verify_column_tables, Collector, ScopeChain, Verifiable};

/// Type of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// INNER JOIN.
    #[default]
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// `LIMIT rows [OFFSET offset]`.
///
/// Negative arguments are rejected by validation, not at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    rows: i64,
    offset: Option<i64>,
}

impl Limit {
    /// Limits the result to `rows` rows.
    #[must_use]
    pub const fn new(rows: i64) -> Self {
        Self { rows, offset: None }
    }

    /// Skips `offset` rows first.
    #[must_use]
    pub const fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl SqlNode for Limit {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("LIMIT ")?;
        w.append(&self.rows.to_string())?;
        if let Some(offset) = self.offset {
            w.append(" OFFSET ")?;
            w.append(&offset.to_string())?;
        }
        Ok(())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_verifiable(self);
    }
}

impl Verifiable for Limit {
    fn verify(&self, _scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
        if self.rows < 0 {
            return Err(ValidationError::for_node(
                format!("LIMIT row count must not be negative: {}", self.rows),
                self,
            ));
        }
        match self.offset {
            Some(offset) if offset < 0 => Err(ValidationError::for_node(
                format!("LIMIT offset must not be negative: {offset}"),
                self,
            )),
            _ => Ok(()),
        }
    }
}

enum SelectItem {
    Expr(BoxedNode),
    All(AllColumns),
    Table(TableWildcard),
}

impl SelectItem {
    const fn is_wildcard(&self) -> bool {
        matches!(self, Self::All(_) | Self::Table(_))
    }

    fn node(&self) -> &dyn SqlNode {
        match self {
            Self::Expr(node) => node,
            Self::All(all) => all,
            Self::Table(wildcard) => wildcard,
        }
    }
}

enum JoinOn {
    Condition(BoxedNode),
    Columns(DbJoin),
    Nothing,
}

struct Join {
    join_type: JoinType,
    from: TableRef,
    to: TableRef,
    on: JoinOn,
}

impl Join {
    fn link(&self) -> JoinLink<'_> {
        match &self.on {
            JoinOn::Columns(join) => JoinLink {
                from_columns: join.from_columns().len(),
                to_columns: join.to_columns().len(),
                ..JoinLink::new(&self.from, &self.to)
            },
            JoinOn::Condition(_) | JoinOn::Nothing => JoinLink::new(&self.from, &self.to),
        }
    }
}

impl SqlNode for Join {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append(self.join_type.as_str())?;
        w.append(" ")?;
        self.to.render(w)?;
        let on: Option<&dyn SqlNode> = match &self.on {
            JoinOn::Condition(condition) => Some(condition),
            JoinOn::Columns(join) => Some(join),
            JoinOn::Nothing => None,
        };
        if let Some(on) = on.filter(|on| !on.is_empty()) {
            w.append(" ON ")?;
            on.render(w)?;
        }
        Ok(())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        collector.add_table(&self.from);
        collector.add_table(&self.to);
        match &self.on {
            JoinOn::Condition(condition) => condition.collect(collector),
            JoinOn::Columns(join) => join.collect(collector),
            JoinOn::Nothing => {}
        }
    }
}

struct OrderItem {
    expr: BoxedNode,
    direction: OrderDirection,
}

/// A SELECT statement.
///
/// Without explicit FROM tables or joins the FROM clause is inferred at
/// every render from the columns the statement uses, leaving out tables
/// already introduced by an enclosing query.
#[derive(Default)]
pub struct SelectQuery {
    distinct: bool,
    columns: Vec<SelectItem>,
    from: Vec<TableRef>,
    joins: Vec<Join>,
    where_clause: ComboCondition,
    group_by: Vec<BoxedNode>,
    having: ComboCondition,
    order_by: Vec<OrderItem>,
    limit: Option<Limit>,
}

impl SelectQuery {
    /// Creates an empty SELECT.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a projected expression.
    #[must_use]
    pub fn column(mut self, column: impl IntoNode) -> Self {
        self.columns.push(SelectItem::Expr(column.into_node()));
        self
    }

    /// Adds `*`.
    #[must_use]
    pub fn all(mut self) -> Self {
        self.columns.push(SelectItem::All(AllColumns));
        self
    }

    /// Adds `table.*`.
    #[must_use]
    pub fn table_all(mut self, table: &TableRef) -> Self {
        self.columns.push(SelectItem::Table(TableWildcard::new(table)));
        self
    }

    /// Adds an explicit FROM table.
    #[must_use]
    pub fn from(mut self, table: &TableRef) -> Self {
        self.from.push(table.clone());
        self
    }

    /// Joins `to` from `from` on an arbitrary condition.
    #[must_use]
    pub fn join(
        mut self,
        join_type: JoinType,
        from: &TableRef,
        to: &TableRef,
        on: impl IntoNode,
    ) -> Self {
        self.joins.push(Join {
            join_type,
            from: from.clone(),
            to: to.clone(),
            on: JoinOn::Condition(on.into_node()),
        });
        self
    }

    /// Joins along a [`DbJoin`], using its paired columns as the condition.
    #[must_use]
    pub fn join_on(mut self, join_type: JoinType, join: DbJoin) -> Self {
        self.joins.push(Join {
            join_type,
            from: join.from_table().clone(),
            to: join.to_table().clone(),
            on: JoinOn::Columns(join),
        });
        self
    }

    /// Cross joins `to` from `from`.
    #[must_use]
    pub fn cross_join(mut self, from: &TableRef, to: &TableRef) -> Self {
        self.joins.push(Join {
            join_type: JoinType::Cross,
            from: from.clone(),
            to: to.clone(),
            on: JoinOn::Nothing,
        });
        self
    }

    /// Adds a WHERE condition, combined with AND.
    #[must_use]
    pub fn where_clause(mut self, condition: impl IntoNode) -> Self {
        self.where_clause.push(condition);
        self
    }

    /// Adds a GROUP BY expression.
    #[must_use]
    pub fn group_by(mut self, expr: impl IntoNode) -> Self {
        self.group_by.push(expr.into_node());
        self
    }

    /// Adds a HAVING condition, combined with AND.
    #[must_use]
    pub fn having(mut self, condition: impl IntoNode) -> Self {
        self.having.push(condition);
        self
    }

    /// Adds an ascending ORDER BY expression.
    #[must_use]
    pub fn order_by(self, expr: impl IntoNode) -> Self {
        self.order_by_direction(expr, OrderDirection::Asc)
    }

    /// Adds a descending ORDER BY expression.
    #[must_use]
    pub fn order_by_desc(self, expr: impl IntoNode) -> Self {
        self.order_by_direction(expr, OrderDirection::Desc)
    }

    fn order_by_direction(mut self, expr: impl IntoNode, direction: OrderDirection) -> Self {
        self.order_by.push(OrderItem {
            expr: expr.into_node(),
            direction,
        });
        self
    }

    /// Sets the LIMIT clause.
    #[must_use]
    pub const fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Number of projected columns, or `None` when a wildcard makes it
    /// unknowable.
    #[must_use]
    pub fn column_count(&self) -> Option<usize> {
        if self.columns.is_empty() || self.columns.iter().any(SelectItem::is_wildcard) {
            return None;
        }
        Some(self.columns.len())
    }

    const fn has_implicit_from(&self) -> bool {
        self.from.is_empty() && self.joins.is_empty()
    }

    fn explicit_tables(&self) -> IndexSet<TableRef> {
        let mut tables: IndexSet<TableRef> = self.from.iter().cloned().collect();
        for join in &self.joins {
            tables.insert(join.from.clone());
            tables.insert(join.to.clone());
        }
        tables
    }

    /// Tables reached through this statement's own columns, nested
    /// statements excluded.
    fn own_column_tables(&self) -> IndexSet<TableRef> {
        let mut collector = Collector::shallow();
        self.collect_clauses(&mut collector);
        collector.into_root().column_tables().clone()
    }

    fn from_tables(&self, context: &RenderContext) -> IndexSet<TableRef> {
        if self.has_implicit_from() {
            infer_from_tables(&self.own_column_tables(), context)
        } else {
            self.explicit_tables()
        }
    }

    fn collect_clauses<'a>(&'a self, collector: &mut Collector<'a>) {
        for item in &self.columns {
            item.node().collect(collector);
        }
        for join in &self.joins {
            join.collect(collector);
        }
        self.where_clause.collect(collector);
        for expr in &self.group_by {
            expr.collect(collector);
        }
        self.having.collect(collector);
        for item in &self.order_by {
            item.expr.collect(collector);
        }
        if let Some(limit) = &self.limit {
            limit.collect(collector);
        }
    }

    fn render_from(
        &self,
        w: &mut SqlWriter<'_>,
        tables: &IndexSet<TableRef>,
    ) -> Result<(), RenderError> {
        let Some(first) = self.joins.first() else {
            if tables.is_empty() {
                return Ok(());
            }
            w.append(" FROM ")?;
            for (i, table) in tables.iter().enumerate() {
                if i > 0 {
                    w.append(", ")?;
                }
                table.render(w)?;
            }
            return Ok(());
        };

        w.append(" FROM ")?;
        let in_chain = |table: &TableRef| {
            self.joins
                .iter()
                .any(|join| &join.from == table || &join.to == table)
        };
        for table in self.from.iter().filter(|table| !in_chain(*table)) {
            table.render(w)?;
            w.append(", ")?;
        }
        first.from.render(w)?;
        for join in &self.joins {
            w.append(" ")?;
            join.render(w)?;
        }
        Ok(())
    }
}

impl SqlNode for SelectQuery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        let tables = self.from_tables(w.context());
        let mut w = w.scoped();
        w.context_mut().enter_query(tables.clone());

        w.append("SELECT ")?;
        if self.distinct {
            w.append("DISTINCT ")?;
        }
        if self.columns.is_empty() {
            w.append("*")?;
        }
        for (i, item) in self.columns.iter().enumerate() {
            if i > 0 {
                w.append(", ")?;
            }
            item.node().render(&mut w)?;
        }

        self.render_from(&mut w, &tables)?;

        if !self.where_clause.is_empty() {
            w.append(" WHERE ")?;
            self.where_clause.render_ungrouped(&mut w)?;
        }
        if !self.group_by.is_empty() {
            w.append(" GROUP BY ")?;
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    w.append(", ")?;
                }
                expr.render(&mut w)?;
            }
        }
        if !self.having.is_empty() {
            w.append(" HAVING ")?;
            self.having.render_ungrouped(&mut w)?;
        }
        if !self.order_by.is_empty() {
            w.append(" ORDER BY ")?;
            for (i, item) in self.order_by.iter().enumerate() {
                if i > 0 {
                    w.append(", ")?;
                }
                item.expr.render(&mut w)?;
                if item.direction == OrderDirection::Desc {
                    w.append(" DESC")?;
                }
            }
        }
        if let Some(limit) = &self.limit {
            w.append(" ")?;
            limit.render(&mut w)?;
        }
        Ok(())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        for table in &self.from {
            collector.add_table(table);
        }
        self.collect_clauses(collector);
        if self.has_implicit_from() {
            let chain = collector.scope();
            let inferred: Vec<TableRef> = chain
                .scope()
                .column_tables()
                .iter()
                .filter(|table| !chain.is_visible_from_enclosing(table))
                .cloned()
                .collect();
            for table in &inferred {
                collector.add_table(table);
            }
        }
        collector.add_verifiable(self);
    }
}

impl Verifiable for SelectQuery {
    fn verify(&self, scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
        if !self.joins.is_empty() {
            let links: Vec<JoinLink<'_>> = self.joins.iter().map(Join::link).collect();
            verify_join_chain(&links).map_err(|err| err.at(self))?;
        }
        verify_column_tables(scope, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::render;
    use crate::query::{BinaryCondition, CustomSql, Value};
    use crate::schema::DbSpec;
    use crate::validate::validate;

    #[test]
    fn test_implicit_from() {
        let mut spec = DbSpec::new();
        let mut customers = spec.add_table("customers");
        let name = customers.add_column("name", "TEXT");
        let age = customers.add_column("age", "INTEGER");

        let query = SelectQuery::new()
            .column(name.clone())
            .where_clause(BinaryCondition::gt(age, Value::new(18)))
            .order_by_desc(name)
            .limit(Limit::new(10).offset(20));
        assert_eq!(
            render(&query).unwrap(),
            "SELECT t0.name FROM customers t0 WHERE t0.age > 18 ORDER BY t0.name DESC LIMIT 10 OFFSET 20"
        );
        assert!(validate(&query).is_ok());
    }

    #[test]
    fn test_explicit_join_chain() {
        let mut spec = DbSpec::new();
        let mut customers = spec.add_table("customers");
        let mut orders = spec.add_table("orders");
        let id = customers.add_column("id", "INTEGER");
        let customer_id = orders.add_column("customer_id", "INTEGER");
        let total = orders.add_column("total", "REAL");

        let query = SelectQuery::new()
            .column(total)
            .join_on(
                JoinType::Left,
                DbJoin::new(
                    customers.table_ref(),
                    orders.table_ref(),
                    &[id],
                    &[customer_id],
                ),
            );
        assert_eq!(
            render(&query).unwrap(),
            "SELECT t1.total FROM customers t0 LEFT JOIN orders t1 ON t0.id = t1.customer_id"
        );
        assert!(validate(&query).is_ok());
    }

    #[test]
    fn test_unreferenced_table_with_explicit_from() {
        let mut spec = DbSpec::new();
        let customers = spec.add_table("customers");
        let mut orders = spec.add_table("orders");
        let total = orders.add_column("total", "REAL");

        let query = SelectQuery::new().column(total).from(customers.table_ref());
        let err = validate(&query).unwrap_err();
        assert_eq!(err.message(), "Columns used for unreferenced tables: orders");
        assert_eq!(
            err.node_text(),
            Some("SELECT t1.total FROM customers t0")
        );
    }

    #[test]
    fn test_wildcards_and_counts() {
        let mut spec = DbSpec::new();
        let orders = spec.add_table("orders");
        let query = SelectQuery::new()
            .table_all(orders.table_ref())
            .from(orders.table_ref());
        assert_eq!(render(&query).unwrap(), "SELECT t0.* FROM orders t0");
        assert_eq!(query.column_count(), None);

        let counted = SelectQuery::new()
            .column(CustomSql::new("1"))
            .column(CustomSql::new("2"));
        assert_eq!(counted.column_count(), Some(2));
        assert_eq!(render(&counted).unwrap(), "SELECT 1, 2");
    }

    #[test]
    fn test_negative_limit() {
        let query = SelectQuery::new()
            .column(CustomSql::new("1"))
            .limit(Limit::new(-1));
        let err = validate(&query).unwrap_err();
        assert_eq!(err.message(), "LIMIT row count must not be negative: -1");
        assert_eq!(err.node_text(), Some("LIMIT -1"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let mut spec = DbSpec::new();
        let mut products = spec.add_table("products");
        let price = products.add_column("price", "REAL");
        let query = SelectQuery::new()
            .distinct()
            .column(price.clone())
            .group_by(price.clone())
            .having(BinaryCondition::lt(price, Value::new(5)));
        let first = render(&query).unwrap();
        assert_eq!(first, render(&query).unwrap());
        assert_eq!(
            first,
            "SELECT DISTINCT t0.price FROM products t0 GROUP BY t0.price HAVING t0.price < 5"
        );
    }
}
