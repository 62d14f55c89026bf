//! # sqlweave-core
//!
//! Composable SQL statement trees that render themselves.
//!
//! This crate provides:
//! - A node contract ([`SqlNode`]) every clause implements, rendering
//!   straight into a [`SqlWriter`] without intermediate strings
//! - An inheritable, stack-scoped [`RenderContext`] so nested statements
//!   can change presentation without affecting their siblings
//! - Two-phase schema validation with per-statement scopes
//! - Implicit FROM inference that understands correlated subqueries, and
//!   join-chain connectivity checks
//! - Placeholders and result columns that record the position they were
//!   rendered at, for binding parameters and reading rows afterwards
//!
//! ## Example
//!
//! ```rust
//! use sqlweave_core::query::{BinaryCondition, SelectQuery};
//! use sqlweave_core::schema::DbSpec;
//! use sqlweave_core::{render, validate, BoundParameters, ParameterSession};
//!
//! let mut spec = DbSpec::new();
//! let mut customers = spec.add_table("customers");
//! let name = customers.add_column("name", "TEXT");
//! let age = customers.add_column("age", "INTEGER");
//!
//! let session = ParameterSession::default();
//! let min_age = session.placeholder();
//! let query = SelectQuery::new()
//!     .column(name)
//!     .where_clause(BinaryCondition::gt_eq(age, min_age.clone()));
//!
//! validate(&query)?;
//! let sql = render(&query)?;
//! assert_eq!(sql, "SELECT t0.name FROM customers t0 WHERE t0.age >= ?");
//!
//! let mut params = BoundParameters::new();
//! min_age.bind(&mut params, 18)?;
//! assert_eq!(min_age.index(), Some(1));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod context;
pub mod error;
pub mod join;
pub mod node;
pub mod options;
pub mod params;
pub mod query;
pub mod reader;
pub mod schema;
pub mod sink;
pub mod validate;
pub mod value;

pub use context::RenderContext;
pub use error::{BindError, ReadError, RenderError, ValidationError};
pub use node::{render, render_in, render_with, BoxedNode, IntoNode, NodeList, SqlDisplay, SqlNode};
pub use options::{RenderOptions, SessionOptions};
pub use params::{
    Bound, BoundParameters, MultiPlaceholder, ParameterSession, ParameterTarget, Placeholder,
    StaticPlaceholder,
};
pub use reader::{ColumnSession, ReadColumn, RowSource};
pub use sink::SqlWriter;
pub use validate::{collect_schema, validate, Verifiable};
pub use value::{SqlType, SqlValue, ToSqlValue};
