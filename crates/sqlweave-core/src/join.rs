//! FROM clause inference and join-chain connectivity.

use indexmap::IndexSet;
use tracing::trace;

use crate::context::RenderContext;
use crate::error::ValidationError;
use crate::schema::TableRef;

/// One explicit join as seen by the connectivity check.
#[derive(Debug, Clone, Copy)]
pub struct JoinLink<'j> {
    /// Table the join starts from.
    pub from: &'j TableRef,
    /// Table the join introduces.
    pub to: &'j TableRef,
    /// Number of columns on the `from` side of the condition.
    pub from_columns: usize,
    /// Number of columns on the `to` side of the condition.
    pub to_columns: usize,
}

impl<'j> JoinLink<'j> {
    /// A link whose condition is opaque (no paired columns to count).
    #[must_use]
    pub const fn new(from: &'j TableRef, to: &'j TableRef) -> Self {
        Self {
            from,
            to,
            from_columns: 0,
            to_columns: 0,
        }
    }
}

/// Derives the FROM tables of a statement without explicit joins.
///
/// Keeps the tables reached through the statement's own columns in
/// first-reference order and drops those introduced by an enclosing
/// query, so a correlated subquery does not re-declare outer tables.
#[must_use]
pub fn infer_from_tables<'t>(
    column_tables: impl IntoIterator<Item = &'t TableRef>,
    context: &RenderContext,
) -> IndexSet<TableRef> {
    let tables: IndexSet<TableRef> = column_tables
        .into_iter()
        .filter(|table| !context.is_visible_from_enclosing(table))
        .cloned()
        .collect();
    trace!(
        tables = ?tables.iter().map(TableRef::name).collect::<Vec<_>>(),
        "inferred FROM tables"
    );
    tables
}

/// Checks that every join starts from a table already introduced.
///
/// The first link's `from` seeds the chain; every later link must start
/// from that seed or from a table introduced by a previous link. Paired
/// condition columns must match in number: unpaired leftovers are a
/// fault too.
///
/// Returns the introduced tables in order.
///
/// # Errors
///
/// Returns a [`ValidationError`] on the first disconnected link or
/// column count mismatch.
pub fn verify_join_chain(links: &[JoinLink<'_>]) -> Result<IndexSet<TableRef>, ValidationError> {
    let mut introduced = IndexSet::new();
    for (i, link) in links.iter().enumerate() {
        if i == 0 {
            introduced.insert(link.from.clone());
        } else if !introduced.contains(link.from) {
            return Err(ValidationError::new(format!(
                "Table used in join is not given among the previous tables: {}",
                link.from.name()
            )));
        }
        if link.from_columns != link.to_columns {
            return Err(ValidationError::new(format!(
                "Join from {} to {} pairs {} columns with {}",
                link.from.name(),
                link.to.name(),
                link.from_columns,
                link.to_columns
            )));
        }
        introduced.insert(link.to.clone());
    }
    Ok(introduced)
}
