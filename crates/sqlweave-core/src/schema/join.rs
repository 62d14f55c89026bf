//! Join descriptors between two tables.

use super::{DbColumn, TableRef};
use crate::error::RenderError;
use crate::node::SqlNode;
use crate::sink::SqlWriter;
use crate::validate::Collector;

/// Equality join from one table to another over paired columns.
///
/// As a node it renders the ON condition, `a = b AND c = d`.
#[derive(Debug, Clone)]
pub struct DbJoin {
    from: TableRef,
    to: TableRef,
    from_columns: Vec<DbColumn>,
    to_columns: Vec<DbColumn>,
}

impl DbJoin {
    /// Joins `from_columns` of `from` to `to_columns` of `to`, pairwise.
    #[must_use]
    pub fn new(
        from: &TableRef,
        to: &TableRef,
        from_columns: &[DbColumn],
        to_columns: &[DbColumn],
    ) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            from_columns: from_columns.to_vec(),
            to_columns: to_columns.to_vec(),
        }
    }

    /// The table joined from.
    #[must_use]
    pub const fn from_table(&self) -> &TableRef {
        &self.from
    }

    /// The table joined to.
    #[must_use]
    pub const fn to_table(&self) -> &TableRef {
        &self.to
    }

    /// Columns on the `from` side.
    #[must_use]
    pub fn from_columns(&self) -> &[DbColumn] {
        &self.from_columns
    }

    /// Columns on the `to` side.
    #[must_use]
    pub fn to_columns(&self) -> &[DbColumn] {
        &self.to_columns
    }
}

impl SqlNode for DbJoin {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        for (i, (left, right)) in self.from_columns.iter().zip(&self.to_columns).enumerate() {
            if i > 0 {
                w.append(" AND ")?;
            }
            left.render(w)?;
            w.append(" = ")?;
            right.render(w)?;
        }
        Ok(())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        for column in self.from_columns.iter().chain(&self.to_columns) {
            collector.add_column(column);
        }
    }

    fn is_empty(&self) -> bool {
        self.from_columns.is_empty() || self.to_columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::render;
    use crate::schema::DbSpec;

    #[test]
    fn test_join_condition() {
        let mut spec = DbSpec::new();
        let mut customers = spec.add_table("customers");
        let mut orders = spec.add_table("orders");
        let id = customers.add_column("id", "INTEGER");
        let region = customers.add_column("region", "TEXT");
        let customer_id = orders.add_column("customer_id", "INTEGER");
        let order_region = orders.add_column("region", "TEXT");

        let join = DbJoin::new(
            customers.table_ref(),
            orders.table_ref(),
            &[id, region],
            &[customer_id, order_region],
        );
        assert_eq!(
            render(&join).unwrap(),
            "t0.id = t1.customer_id AND t0.region = t1.region"
        );
    }
}
