//! Two-phase schema collection and validation.
//!
//! The collect phase walks the tree once and records, per statement scope,
//! the tables and columns it references and the nodes that want to check
//! themselves. Sub-statements open a child scope chained to the current
//! one: their references stay out of the parent, but lookups can still
//! walk outwards. The validate phase then runs every registered check in
//! registration order against its fully populated scope and stops at the
//! first failure. Statements register after their children, so checks run
//! in post-order: an inner statement is checked before the one containing
//! it.

use indexmap::IndexSet;
use tracing::debug;

use crate::error::ValidationError;
use crate::node::SqlNode;
use crate::schema::{DbColumn, TableRef};

/// Index of a scope inside a [`Collector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// References accumulated for one (sub-)statement.
#[derive(Debug, Default)]
pub struct ValidationScope {
    tables: IndexSet<TableRef>,
    columns: IndexSet<DbColumn>,
    column_tables: IndexSet<TableRef>,
    parent: Option<ScopeId>,
}

impl ValidationScope {
    /// Tables referenced directly, in first-reference order.
    #[must_use]
    pub const fn tables(&self) -> &IndexSet<TableRef> {
        &self.tables
    }

    /// Columns referenced, in first-reference order.
    #[must_use]
    pub const fn columns(&self) -> &IndexSet<DbColumn> {
        &self.columns
    }

    /// Tables reached through columns or table wildcards, in
    /// first-reference order.
    #[must_use]
    pub const fn column_tables(&self) -> &IndexSet<TableRef> {
        &self.column_tables
    }
}

/// A node that checks itself once collection is complete.
pub trait Verifiable: SqlNode {
    /// Checks the node against its scope.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first violation.
    fn verify(&self, scope: &ScopeChain<'_>) -> Result<(), ValidationError>;
}

/// Collect-phase state: the scope arena and the registered checks.
pub struct Collector<'a> {
    scopes: Vec<ValidationScope>,
    current: ScopeId,
    verifiables: Vec<(ScopeId, &'a dyn Verifiable)>,
    shallow: bool,
}

impl<'a> Collector<'a> {
    /// Creates a collector with an empty root scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![ValidationScope::default()],
            current: ScopeId(0),
            verifiables: Vec::new(),
            shallow: false,
        }
    }

    /// Creates a collector that skips nested statements entirely.
    ///
    /// Its root scope ends up with the references a statement makes itself.
    #[must_use]
    pub fn shallow() -> Self {
        Self {
            shallow: true,
            ..Self::new()
        }
    }

    /// Records a table reference in the current scope.
    pub fn add_table(&mut self, table: &TableRef) {
        let scope = &mut self.scopes[self.current.0];
        scope.tables.insert(table.clone());
    }

    /// Records a column reference, and its table, in the current scope.
    pub fn add_column(&mut self, column: &DbColumn) {
        let scope = &mut self.scopes[self.current.0];
        scope.column_tables.insert(column.table().clone());
        scope.columns.insert(column.clone());
    }

    /// Records a table reached through a `table.*` projection.
    pub fn add_wildcard_table(&mut self, table: &TableRef) {
        let scope = &mut self.scopes[self.current.0];
        scope.column_tables.insert(table.clone());
    }

    /// Registers a check to run against the current scope.
    pub fn add_verifiable(&mut self, node: &'a dyn Verifiable) {
        self.verifiables.push((self.current, node));
    }

    /// Runs `body` inside a new child scope of the current one.
    ///
    /// A shallow collector does not run `body` at all.
    pub fn nested(&mut self, body: impl FnOnce(&mut Self)) {
        if self.shallow {
            return;
        }
        let parent = self.current;
        self.scopes.push(ValidationScope {
            parent: Some(parent),
            ..ValidationScope::default()
        });
        self.current = ScopeId(self.scopes.len() - 1);
        body(self);
        self.current = parent;
    }

    /// View of the current scope and its ancestors.
    #[must_use]
    pub fn scope(&self) -> ScopeChain<'_> {
        ScopeChain {
            scopes: &self.scopes,
            id: self.current,
        }
    }

    /// Number of registered checks.
    #[must_use]
    pub fn verifiable_count(&self) -> usize {
        self.verifiables.len()
    }

    /// Consumes the collector, keeping only the root scope.
    #[must_use]
    pub fn into_root(self) -> ValidationScope {
        self.scopes.into_iter().next().unwrap_or_default()
    }

    fn run_checks(self) -> Result<(), ValidationError> {
        let Self {
            scopes,
            verifiables,
            ..
        } = self;
        for (id, node) in verifiables {
            let chain = ScopeChain {
                scopes: &scopes,
                id,
            };
            node.verify(&chain).inspect_err(|err| {
                debug!(message = err.message(), "validation failed");
            })?;
        }
        Ok(())
    }
}

impl Default for Collector<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a scope and the chain of scopes enclosing it.
#[derive(Clone, Copy)]
pub struct ScopeChain<'s> {
    scopes: &'s [ValidationScope],
    id: ScopeId,
}

impl<'s> ScopeChain<'s> {
    /// The scope this view starts at.
    #[must_use]
    pub fn scope(&self) -> &'s ValidationScope {
        &self.scopes[self.id.0]
    }

    /// The enclosing scope, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.scope().parent.map(|id| Self {
            scopes: self.scopes,
            id,
        })
    }

    /// Returns true if `table` is referenced by this scope or by any
    /// enclosing one.
    #[must_use]
    pub fn is_visible(&self, table: &TableRef) -> bool {
        self.scope().tables.contains(table) || self.is_visible_from_enclosing(table)
    }

    /// Returns true if `table` is referenced by an enclosing scope.
    #[must_use]
    pub fn is_visible_from_enclosing(&self, table: &TableRef) -> bool {
        let mut current = self.parent();
        while let Some(chain) = current {
            if chain.scope().tables.contains(table) {
                return true;
            }
            current = chain.parent();
        }
        false
    }
}

/// Fails if a column or wildcard of this scope belongs to a table that is
/// not referenced anywhere along the scope chain.
///
/// This is the default invariant of every statement.
///
/// # Errors
///
/// Returns "Columns used for unreferenced tables" pointing at `node`.
pub fn verify_column_tables(
    scope: &ScopeChain<'_>,
    node: &dyn SqlNode,
) -> Result<(), ValidationError> {
    let missing: Vec<&str> = scope
        .scope()
        .column_tables
        .iter()
        .filter(|table| !scope.is_visible(table))
        .map(TableRef::name)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(ValidationError::for_node(
        format!("Columns used for unreferenced tables: {}", missing.join(", ")),
        node,
    ))
}

/// Runs the collect phase only and returns the root scope.
#[must_use]
pub fn collect_schema(node: &dyn SqlNode) -> ValidationScope {
    let mut collector = Collector::new();
    node.collect(&mut collector);
    collector.into_root()
}

/// Collects `node` and checks every registered verifiable.
///
/// Checks run in post-order: children before the node that contains them,
/// siblings left to right. A nested statement's fault is therefore
/// reported before one of the statement around it.
///
/// # Errors
///
/// Returns the first [`ValidationError`]; later checks are not run.
pub fn validate(node: &dyn SqlNode) -> Result<(), ValidationError> {
    let mut collector = Collector::new();
    node.collect(&mut collector);
    debug!(
        checks = collector.verifiable_count(),
        scopes = collector.scopes.len(),
        "validating statement"
    );
    collector.run_checks()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::schema::DbSpec;
    use crate::sink::SqlWriter;
    use std::cell::RefCell;

    struct Recorder {
        name: &'static str,
        fail: bool,
        log: RefCell<Vec<&'static str>>,
    }

    impl SqlNode for Recorder {
        fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
            w.append(self.name)
        }

        fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
            collector.add_verifiable(self);
        }
    }

    impl Verifiable for Recorder {
        fn verify(&self, _scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
            self.log.borrow_mut().push(self.name);
            if self.fail {
                return Err(ValidationError::for_node("check failed", self));
            }
            Ok(())
        }
    }

    fn recorder(name: &'static str, fail: bool) -> Recorder {
        Recorder {
            name,
            fail,
            log: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_shallow_collector_skips_nested_scopes() {
        let mut spec = DbSpec::new();
        let mut customers = spec.add_table("customers");
        let mut orders = spec.add_table("orders");
        let name = customers.add_column("name", "TEXT");
        let total = orders.add_column("total", "REAL");

        let mut collector = Collector::shallow();
        collector.add_column(&name);
        collector.nested(|inner| inner.add_column(&total));
        assert_eq!(collector.scopes.len(), 1);
        let root = collector.into_root();
        assert_eq!(root.column_tables().len(), 1);
        assert!(root.column_tables().contains(customers.table_ref()));
    }

    #[test]
    fn test_fail_fast_in_registration_order() {
        let first = recorder("first", false);
        let second = recorder("second", true);
        let third = recorder("third", true);

        let mut collector = Collector::new();
        first.collect(&mut collector);
        second.collect(&mut collector);
        third.collect(&mut collector);
        let err = collector.run_checks().unwrap_err();

        assert_eq!(err.message(), "check failed");
        assert_eq!(err.node_text(), Some("second"));
        assert_eq!(*first.log.borrow(), vec!["first"]);
        assert!(third.log.borrow().is_empty());
    }

    #[test]
    fn test_child_scope_does_not_merge_upwards() {
        let mut spec = DbSpec::new();
        let mut customers = spec.add_table("customers");
        let mut orders = spec.add_table("orders");
        let name = customers.add_column("name", "TEXT");
        let total = orders.add_column("total", "REAL");

        let mut collector = Collector::new();
        collector.add_table(customers.table_ref());
        collector.add_column(&name);
        collector.nested(|inner| {
            inner.add_column(&total);
            inner.add_table(orders.table_ref());
            let chain = inner.scope();
            assert!(chain.is_visible(customers.table_ref()));
            assert!(chain.is_visible_from_enclosing(customers.table_ref()));
            assert!(!chain.is_visible_from_enclosing(orders.table_ref()));
        });

        let root = collector.into_root();
        assert_eq!(root.tables().len(), 1);
        assert_eq!(root.columns().len(), 1);
        assert!(!root.column_tables().contains(orders.table_ref()));
    }

    #[test]
    fn test_unreferenced_column_table() {
        let mut spec = DbSpec::new();
        let customers = spec.add_table("customers");
        let mut orders = spec.add_table("orders");
        let total = orders.add_column("total", "REAL");

        let mut collector = Collector::new();
        collector.add_table(customers.table_ref());
        collector.add_column(&total);
        let err = verify_column_tables(&collector.scope(), &total).unwrap_err();
        assert_eq!(err.message(), "Columns used for unreferenced tables: orders");
        assert_eq!(err.node_text(), Some("t1.total"));
    }
}
