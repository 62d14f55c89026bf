#![allow(dead_code)]

use sqlweave_core::schema::{ColumnDef, DbColumn, DbJoin, DbSpec, DbTable};
use sqlweave_core::{render, SqlNode};

/// Customers, orders and products, aliased `t0`, `t1` and `t2`.
pub struct Shop {
    pub customers: DbTable,
    pub orders: DbTable,
    pub products: DbTable,
    pub customer_id: DbColumn,
    pub customer_name: DbColumn,
    pub customer_region: DbColumn,
    pub order_id: DbColumn,
    pub order_customer: DbColumn,
    pub order_product: DbColumn,
    pub order_total: DbColumn,
    pub product_id: DbColumn,
    pub product_name: DbColumn,
    pub product_price: DbColumn,
}

pub fn shop() -> Shop {
    let mut spec = DbSpec::new();
    let mut customers = spec.add_table("customers");
    let mut orders = spec.add_table("orders");
    let mut products = spec.add_table("products");

    let customer_id = customers.add_column_def(ColumnDef::new("id").type_name("INTEGER").primary_key());
    let customer_name = customers.add_column_def(ColumnDef::new("name").type_name("TEXT").not_null());
    let customer_region = customers.add_column("region", "TEXT");

    let product_id = products.add_column_def(ColumnDef::new("id").type_name("INTEGER").primary_key());
    let product_name = products.add_column("name", "TEXT");
    let product_price = products.add_column("price", "REAL");

    let order_id = orders.add_column_def(ColumnDef::new("id").type_name("INTEGER").primary_key());
    let order_customer = orders.add_column_def(
        ColumnDef::new("customer_id")
            .type_name("INTEGER")
            .references(&customer_id),
    );
    let order_product = orders.add_column_def(
        ColumnDef::new("product_id")
            .type_name("INTEGER")
            .references(&product_id),
    );
    let order_total = orders.add_column("total", "REAL");

    Shop {
        customers,
        orders,
        products,
        customer_id,
        customer_name,
        customer_region,
        order_id,
        order_customer,
        order_product,
        order_total,
        product_id,
        product_name,
        product_price,
    }
}

impl Shop {
    pub fn customer_orders(&self) -> DbJoin {
        DbJoin::new(
            self.customers.table_ref(),
            self.orders.table_ref(),
            &[self.customer_id.clone()],
            &[self.order_customer.clone()],
        )
    }

    pub fn order_products(&self) -> DbJoin {
        DbJoin::new(
            self.orders.table_ref(),
            self.products.table_ref(),
            &[self.order_product.clone()],
            &[self.product_id.clone()],
        )
    }
}

pub fn sql(node: &dyn SqlNode) -> String {
    render(node).unwrap_or_else(|e| panic!("Failed to render: {e}"))
}

/// Routes trace output of the library to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
