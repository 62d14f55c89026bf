//! UNION / INTERSECT / EXCEPT.

use super::select::SelectQuery;
use crate::error::{RenderError, ValidationError};
use crate::node::SqlNode;
use crate::sink::SqlWriter;
use crate::validate::{Collector, ScopeChain, Verifiable};

/// Set operator joining the branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperation {
    /// UNION.
    Union,
    /// UNION ALL.
    UnionAll,
    /// INTERSECT.
    Intersect,
    /// EXCEPT.
    Except,
}

impl SetOperation {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// A statement that produces columns and can appear as a set branch.
pub enum SetBranch {
    /// A plain SELECT.
    Select(SelectQuery),
    /// Another set operation, rendered in parentheses.
    Nested(Box<SetOperationQuery>),
}

impl SetBranch {
    /// Number of columns produced, `None` if a wildcard hides it.
    #[must_use]
    pub fn column_count(&self) -> Option<usize> {
        match self {
            Self::Select(select) => select.column_count(),
            Self::Nested(set) => set.column_count(),
        }
    }
}

impl From<SelectQuery> for SetBranch {
    fn from(select: SelectQuery) -> Self {
        Self::Select(select)
    }
}

impl From<SetOperationQuery> for SetBranch {
    fn from(set: SetOperationQuery) -> Self {
        Self::Nested(Box::new(set))
    }
}

impl SqlNode for SetBranch {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        match self {
            Self::Select(select) => select.render(w),
            Self::Nested(set) => {
                w.append("(")?;
                set.render(w)?;
                w.append(")")
            }
        }
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        match self {
            Self::Select(select) => select.collect(collector),
            Self::Nested(set) => set.collect(collector),
        }
    }
}

/// Branches combined by one set operator.
///
/// Each branch collects in its own scope. All branches must produce the
/// same number of columns unless one of them selects a wildcard.
pub struct SetOperationQuery {
    operation: SetOperation,
    branches: Vec<SetBranch>,
}

impl SetOperationQuery {
    /// Creates a set operation without branches.
    #[must_use]
    pub const fn new(operation: SetOperation) -> Self {
        Self {
            operation,
            branches: Vec::new(),
        }
    }

    /// `UNION`.
    #[must_use]
    pub const fn union() -> Self {
        Self::new(SetOperation::Union)
    }

    /// `UNION ALL`.
    #[must_use]
    pub const fn union_all() -> Self {
        Self::new(SetOperation::UnionAll)
    }

    /// `INTERSECT`.
    #[must_use]
    pub const fn intersect() -> Self {
        Self::new(SetOperation::Intersect)
    }

    /// `EXCEPT`.
    #[must_use]
    pub const fn except() -> Self {
        Self::new(SetOperation::Except)
    }

    /// Appends a branch.
    #[must_use]
    pub fn branch(mut self, branch: impl Into<SetBranch>) -> Self {
        self.branches.push(branch.into());
        self
    }

    /// Shared column count of all branches, `None` if unknowable or if the
    /// branches disagree.
    #[must_use]
    pub fn column_count(&self) -> Option<usize> {
        let counts = self
            .branches
            .iter()
            .map(SetBranch::column_count)
            .collect::<Option<Vec<usize>>>()?;
        let (&first, rest) = counts.split_first()?;
        rest.iter().all(|&n| n == first).then_some(first)
    }
}

impl SqlNode for SetOperationQuery {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        for (i, branch) in self.branches.iter().enumerate() {
            if i > 0 {
                w.append(" ")?;
                w.append(self.operation.as_str())?;
                w.append(" ")?;
            }
            branch.render(w)?;
        }
        Ok(())
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        for branch in &self.branches {
            collector.nested(|inner| branch.collect(inner));
        }
        collector.add_verifiable(self);
    }

    fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl Verifiable for SetOperationQuery {
    fn verify(&self, _scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
        let Some(counts) = self
            .branches
            .iter()
            .map(SetBranch::column_count)
            .collect::<Option<Vec<usize>>>()
        else {
            return Ok(());
        };
        if counts.windows(2).all(|pair| pair[0] == pair[1]) {
            return Ok(());
        }
        let listed: Vec<String> = counts.iter().map(ToString::to_string).collect();
        Err(ValidationError::for_node(
            format!(
                "{} branches have different column counts: {}",
                self.operation.as_str(),
                listed.join(", ")
            ),
            self,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::render;
    use crate::query::CustomSql;
    use crate::validate::validate;

    fn select(columns: &[&str]) -> SelectQuery {
        columns
            .iter()
            .fold(SelectQuery::new(), |q, c| q.column(CustomSql::new(*c)))
    }

    #[test]
    fn test_union_render() {
        let set = SetOperationQuery::union_all()
            .branch(select(&["1"]))
            .branch(SetOperationQuery::except().branch(select(&["2"])).branch(select(&["3"])));
        assert_eq!(
            render(&set).unwrap(),
            "SELECT 1 UNION ALL (SELECT 2 EXCEPT SELECT 3)"
        );
        assert_eq!(set.column_count(), Some(1));
        assert!(validate(&set).is_ok());
    }

    #[test]
    fn test_column_count_mismatch() {
        let set = SetOperationQuery::union()
            .branch(select(&["1", "2"]))
            .branch(select(&["3"]));
        let err = validate(&set).unwrap_err();
        assert_eq!(err.message(), "UNION branches have different column counts: 2, 1");
    }

    #[test]
    fn test_wildcard_branch_skips_count_check() {
        let set = SetOperationQuery::intersect()
            .branch(select(&["1", "2"]))
            .branch(SelectQuery::new().all().column(CustomSql::new("3")));
        assert_eq!(set.column_count(), None);
        assert!(validate(&set).is_ok());
    }
}
