//! # sqlweave-sqlx
//!
//! Runs sqlweave statements through sqlx against SQLite.
//!
//! - [`SqliteParameters`] receives placeholder values by position and binds
//!   them to a sqlx query in position order
//! - [`SqliteRowSource`] lets result columns read a fetched row
//! - [`PreparedStatement`] validates, renders and binds in one step
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlweave_core::query::{BinaryCondition, SelectQuery};
//! use sqlweave_core::schema::DbSpec;
//! use sqlweave_core::{ColumnSession, ParameterSession};
//! use sqlweave_sqlx::{PreparedStatement, SqliteRowSource};
//!
//! # async fn run(pool: sqlx::SqlitePool) -> sqlweave_sqlx::Result<()> {
//! let mut spec = DbSpec::new();
//! let mut users = spec.add_table("users");
//! let name = users.add_column("name", "TEXT");
//! let age = users.add_column("age", "INTEGER");
//!
//! let params = ParameterSession::default();
//! let columns = ColumnSession::default();
//! let min_age = params.placeholder();
//! let name_column = columns.column(name);
//! let query = SelectQuery::new()
//!     .column(name_column.clone())
//!     .where_clause(BinaryCondition::gt_eq(age, min_age.clone()));
//!
//! let mut statement = PreparedStatement::prepare(&query, &params)?;
//! min_age.bind(statement.parameters_mut(), 18)?;
//! for row in statement.fetch_all(&pool).await? {
//!     let name = name_column.get_text(&SqliteRowSource::new(&row))?;
//!     println!("{name:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod arguments;
pub mod error;
pub mod row;
pub mod statement;

pub use arguments::{SqliteParameters, SqliteQuery};
pub use error::{AdapterError, Result};
pub use row::SqliteRowSource;
pub use statement::PreparedStatement;
