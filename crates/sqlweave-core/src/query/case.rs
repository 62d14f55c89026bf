//! `CASE ... END` expressions.

use crate::error::{RenderError, ValidationError};
use crate::node::{BoxedNode, IntoNode, SqlNode};
use crate::sink::SqlWriter;
use crate::validate::{Collector, ScopeChain, Verifiable};

enum CaseArm {
    When { condition: BoxedNode, result: BoxedNode },
    Else(BoxedNode),
}

/// `CASE WHEN c THEN r ... [ELSE r] END`.
///
/// Arms render in the order they were added; a misplaced or repeated
/// ELSE is reported by validation.
#[derive(Default)]
pub struct CaseStatement {
    arms: Vec<CaseArm>,
}

impl CaseStatement {
    /// Starts an expression without arms.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `WHEN condition THEN result`.
    #[must_use]
    pub fn when(mut self, condition: impl IntoNode, result: impl IntoNode) -> Self {
        self.arms.push(CaseArm::When {
            condition: condition.into_node(),
            result: result.into_node(),
        });
        self
    }

    /// Adds `ELSE result`.
    #[must_use]
    pub fn otherwise(mut self, result: impl IntoNode) -> Self {
        self.arms.push(CaseArm::Else(result.into_node()));
        self
    }
}

impl SqlNode for CaseStatement {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("CASE")?;
        for arm in &self.arms {
            match arm {
                CaseArm::When { condition, result } => {
                    w.append(" WHEN ")?;
                    condition.render(w)?;
                    w.append(" THEN ")?;
                    result.render(w)?;
                }
                CaseArm::Else(result) => {
                    w.append(" ELSE ")?;
                    result.render(w)?;
                }
            }
        }
        w.append(" END")
    }

    fn collect<'a>(&'a self, collector: &mut Collector<'a>) {
        for arm in &self.arms {
            match arm {
                CaseArm::When { condition, result } => {
                    condition.collect(collector);
                    result.collect(collector);
                }
                CaseArm::Else(result) => result.collect(collector),
            }
        }
        collector.add_verifiable(self);
    }

    fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }
}

impl Verifiable for CaseStatement {
    fn verify(&self, _scope: &ScopeChain<'_>) -> Result<(), ValidationError> {
        let last = self.arms.len().saturating_sub(1);
        for (i, arm) in self.arms.iter().enumerate() {
            if matches!(arm, CaseArm::Else(_)) && i != last {
                return Err(ValidationError::for_node(
                    "ELSE must be the last arm of a CASE expression",
                    self,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::render;
    use crate::query::{CustomSql, Value};
    use crate::validate::validate;

    #[test]
    fn test_case_renders_arms_in_order() {
        let case = CaseStatement::new()
            .when(CustomSql::new("total > 100"), Value::new("big"))
            .otherwise(Value::new("small"));
        assert_eq!(
            render(&case).unwrap(),
            "CASE WHEN total > 100 THEN 'big' ELSE 'small' END"
        );
        assert!(validate(&case).is_ok());
    }

    #[test]
    fn test_else_must_be_last() {
        let case = CaseStatement::new()
            .otherwise(Value::new(0))
            .when(CustomSql::new("a"), Value::new(1));
        let err = validate(&case).unwrap_err();
        assert_eq!(err.message(), "ELSE must be the last arm of a CASE expression");
        assert_eq!(err.node_text(), Some("CASE ELSE 0 WHEN a THEN 1 END"));
    }

    #[test]
    fn test_duplicate_else() {
        let case = CaseStatement::new()
            .when(CustomSql::new("a"), Value::new(1))
            .otherwise(Value::new(2))
            .otherwise(Value::new(3));
        assert!(validate(&case).is_err());
    }
}
