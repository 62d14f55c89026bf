mod common;

use std::time::{Duration, Instant};

use common::{shop, sql, Shop};
use sqlweave_core::query::{
    BinaryCondition, CreateViewQuery, InCondition, JoinType, SelectQuery, SetOperationQuery,
    Subquery, UnaryCondition, UpdateQuery, Value,
};
use sqlweave_core::schema::{DbJoin, DbSpec};
use sqlweave_core::{collect_schema, render, render_with, validate, RenderOptions};

fn orders_of_customer(shop: &Shop) -> SelectQuery {
    SelectQuery::new()
        .column(shop.order_id.clone())
        .where_clause(BinaryCondition::eq(
            shop.order_customer.clone(),
            shop.customer_id.clone(),
        ))
}

#[test]
fn test_correlated_subquery_infers_only_inner_tables() {
    let shop = shop();
    let query = SelectQuery::new()
        .column(shop.customer_name.clone())
        .where_clause(UnaryCondition::exists(Subquery::new(orders_of_customer(&shop))));

    assert_eq!(
        sql(&query),
        "SELECT t0.name FROM customers t0 WHERE EXISTS \
         (SELECT t1.id FROM orders t1 WHERE t1.customer_id = t0.id)"
    );
    assert!(validate(&query).is_ok());

    // the same statement on its own needs both tables
    assert_eq!(
        sql(&orders_of_customer(&shop)),
        "SELECT t1.id FROM orders t1, customers t0 WHERE t1.customer_id = t0.id"
    );
}

#[test]
fn test_subquery_references_stay_in_child_scope() {
    let shop = shop();
    let query = SelectQuery::new()
        .column(shop.customer_name.clone())
        .where_clause(UnaryCondition::exists(Subquery::new(orders_of_customer(&shop))));

    let root = collect_schema(&query);
    assert_eq!(root.tables().len(), 1);
    assert!(root.tables().contains(shop.customers.table_ref()));
    assert!(!root.column_tables().contains(shop.orders.table_ref()));
}

#[test]
fn test_in_subquery_with_explicit_from() {
    let shop = shop();
    let buyers = SelectQuery::new()
        .column(shop.order_customer.clone())
        .from(shop.orders.table_ref())
        .where_clause(BinaryCondition::gt(shop.order_total.clone(), Value::new(100)));
    let query = SelectQuery::new()
        .column(shop.customer_name.clone())
        .where_clause(InCondition::subquery(
            shop.customer_id.clone(),
            Subquery::new(buyers),
        ));
    assert_eq!(
        sql(&query),
        "SELECT t0.name FROM customers t0 WHERE t0.id IN \
         (SELECT t1.customer_id FROM orders t1 WHERE t1.total > 100)"
    );
    assert!(validate(&query).is_ok());
}

#[test]
fn test_connected_join_chain_validates() {
    let shop = shop();
    let query = SelectQuery::new()
        .column(shop.customer_name.clone())
        .column(shop.product_name.clone())
        .join_on(JoinType::Inner, shop.customer_orders())
        .join_on(JoinType::Left, shop.order_products());
    assert!(validate(&query).is_ok());
    assert_eq!(
        sql(&query),
        "SELECT t0.name, t2.name FROM customers t0 \
         INNER JOIN orders t1 ON t0.id = t1.customer_id \
         LEFT JOIN products t2 ON t1.product_id = t2.id"
    );
}

#[test]
fn test_disconnected_join_chain_fails() {
    let mut spec = DbSpec::new();
    let a = spec.add_table("a");
    let b = spec.add_table("b");
    let c = spec.add_table("c");
    let d = spec.add_table("d");
    let on = || Value::new(true);

    let broken = SelectQuery::new()
        .all()
        .join(JoinType::Inner, a.table_ref(), b.table_ref(), on())
        .join(JoinType::Inner, c.table_ref(), d.table_ref(), on());
    let err = validate(&broken).unwrap_err();
    assert_eq!(
        err.message(),
        "Table used in join is not given among the previous tables: c"
    );
    assert_eq!(
        err.node_text(),
        Some("SELECT * FROM a t0 INNER JOIN b t1 ON TRUE INNER JOIN d t3 ON TRUE")
    );

    let chained = SelectQuery::new()
        .all()
        .join(JoinType::Inner, a.table_ref(), b.table_ref(), on())
        .join(JoinType::Inner, b.table_ref(), c.table_ref(), on());
    assert!(validate(&chained).is_ok());
}

#[test]
fn test_unpaired_join_columns_fail() {
    let shop = shop();
    let join = DbJoin::new(
        shop.customers.table_ref(),
        shop.orders.table_ref(),
        &[shop.customer_id.clone(), shop.customer_region.clone()],
        &[shop.order_customer.clone()],
    );
    let query = SelectQuery::new()
        .column(shop.order_total.clone())
        .join_on(JoinType::Inner, join);
    let err = validate(&query).unwrap_err();
    assert_eq!(
        err.message(),
        "Join from customers to orders pairs 2 columns with 1"
    );
}

#[test]
fn test_column_of_unreferenced_table_fails() {
    let shop = shop();
    let query = SelectQuery::new()
        .column(shop.product_name.clone())
        .join_on(JoinType::Inner, shop.customer_orders());
    let err = validate(&query).unwrap_err();
    assert_eq!(err.message(), "Columns used for unreferenced tables: products");
}

#[test]
fn test_set_operation_column_parity() {
    let shop = shop();
    let mismatched = SetOperationQuery::union()
        .branch(
            SelectQuery::new()
                .column(shop.customer_name.clone())
                .column(shop.customer_region.clone()),
        )
        .branch(SelectQuery::new().column(shop.product_name.clone()));
    let err = validate(&mismatched).unwrap_err();
    assert_eq!(err.message(), "UNION branches have different column counts: 2, 1");

    let wildcard = SetOperationQuery::union()
        .branch(
            SelectQuery::new()
                .column(shop.customer_name.clone())
                .column(shop.customer_region.clone()),
        )
        .branch(
            SelectQuery::new()
                .table_all(shop.products.table_ref())
                .from(shop.products.table_ref()),
        );
    assert!(validate(&wildcard).is_ok());
    assert_eq!(
        sql(&wildcard),
        "SELECT t0.name, t0.region FROM customers t0 UNION SELECT t2.* FROM products t2"
    );
}

#[test]
fn test_view_over_select() {
    let shop = shop();
    let view = CreateViewQuery::new(
        "big_orders",
        SelectQuery::new()
            .column(shop.order_id.clone())
            .column(shop.order_total.clone())
            .where_clause(BinaryCondition::gt(shop.order_total.clone(), Value::new(1000))),
    )
    .columns(&["id", "total"]);
    assert!(validate(&view).is_ok());
    assert_eq!(
        render_with(&view, &RenderOptions::new().table_aliases(false)).unwrap(),
        "CREATE VIEW big_orders (id, total) AS SELECT id, total FROM orders WHERE total > 1000"
    );
}

#[test]
fn test_update_with_correlated_subquery() {
    let shop = shop();
    let update = UpdateQuery::table(shop.customers.table_ref())
        .set(&shop.customer_region, Value::new("vip"))
        .where_clause(UnaryCondition::exists(Subquery::new(
            SelectQuery::new()
                .column(shop.order_id.clone())
                .where_clause(BinaryCondition::eq(
                    shop.order_customer.clone(),
                    shop.customer_id.clone(),
                ))
                .where_clause(BinaryCondition::gt(shop.order_total.clone(), Value::new(500))),
        )));
    assert!(validate(&update).is_ok());
    // customers belongs to the UPDATE, so the subquery only adds orders
    assert_eq!(
        render(&update).unwrap(),
        "UPDATE customers SET region = 'vip' WHERE EXISTS \
         (SELECT id FROM orders WHERE customer_id = customers.id AND total > 500)"
    );
}

#[test]
fn test_unaliased_correlation_keeps_outer_table_name() {
    let mut spec = DbSpec::without_aliases();
    let mut customers = spec.add_table("customers");
    let mut orders = spec.add_table("orders");
    let id = customers.add_column("id", "INTEGER");
    let name = customers.add_column("name", "TEXT");
    let order_id = orders.add_column("id", "INTEGER");
    let order_customer = orders.add_column("customer_id", "INTEGER");

    let query = SelectQuery::new()
        .column(name)
        .where_clause(UnaryCondition::exists(Subquery::new(
            SelectQuery::new()
                .column(order_id)
                .where_clause(BinaryCondition::eq(order_customer, id)),
        )));
    assert!(validate(&query).is_ok());
    assert_eq!(
        render(&query).unwrap(),
        "SELECT name FROM customers WHERE EXISTS \
         (SELECT id FROM orders WHERE customer_id = customers.id)"
    );
}

#[test]
fn test_deep_nesting_renders_and_validates_quickly() {
    let shop = shop();
    let columns = [&shop.customer_id, &shop.order_id, &shop.product_id];
    let mut query = SelectQuery::new().column(shop.product_name.clone());
    for level in 0..20 {
        query = SelectQuery::new()
            .column(columns[level % 3].clone())
            .where_clause(UnaryCondition::exists(Subquery::new(query)));
    }

    let started = Instant::now();
    let text = sql(&query);
    assert!(validate(&query).is_ok());
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(text.matches("EXISTS (SELECT").count(), 20);
    // each table is declared once, by the outermost query using it
    assert!(text.starts_with(
        "SELECT t1.id FROM orders t1 WHERE EXISTS \
         (SELECT t0.id FROM customers t0 WHERE EXISTS \
         (SELECT t2.id FROM products t2 WHERE EXISTS \
         (SELECT t1.id WHERE EXISTS"
    ));
    assert!(text.ends_with("(SELECT t2.name))))))))))))))))))))"));
}
