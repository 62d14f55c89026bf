//! Column and table constraints.

use super::TableRef;
use crate::error::RenderError;
use crate::sink::SqlWriter;

/// Kind tag of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// NOT NULL.
    NotNull,
    /// UNIQUE.
    Unique,
    /// PRIMARY KEY.
    PrimaryKey,
    /// FOREIGN KEY / REFERENCES.
    ForeignKey,
    /// CHECK.
    Check,
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Target of a foreign key.
#[derive(Debug, Clone)]
pub struct ForeignKeyRef {
    table: TableRef,
    columns: Vec<String>,
    on_delete: Option<ForeignKeyAction>,
    on_update: Option<ForeignKeyAction>,
}

impl ForeignKeyRef {
    /// References `columns` of `table`.
    #[must_use]
    pub fn new(table: &TableRef, columns: &[&str]) -> Self {
        Self {
            table: table.clone(),
            columns: columns.iter().map(|c| String::from(*c)).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// The referenced table.
    #[must_use]
    pub const fn table(&self) -> &TableRef {
        &self.table
    }

    /// The referenced columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("REFERENCES ")?;
        self.table.render_name(w)?;
        if !self.columns.is_empty() {
            w.append(" (")?;
            w.append(&self.columns.join(", "))?;
            w.append(")")?;
        }
        if let Some(action) = self.on_delete {
            w.append(" ON DELETE ")?;
            w.append(action.as_sql())?;
        }
        if let Some(action) = self.on_update {
            w.append(" ON UPDATE ")?;
            w.append(action.as_sql())?;
        }
        Ok(())
    }
}

/// A constraint, either on a single column or on a whole table.
#[derive(Debug, Clone)]
pub struct DbConstraint {
    kind: ConstraintKind,
    name: Option<String>,
    columns: Vec<String>,
    references: Option<ForeignKeyRef>,
    check: Option<String>,
}

impl DbConstraint {
    /// Creates an unnamed constraint of `kind` with no columns.
    #[must_use]
    pub const fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            name: None,
            columns: Vec::new(),
            references: None,
            check: None,
        }
    }

    /// A PRIMARY KEY over `columns`.
    #[must_use]
    pub fn primary_key(columns: &[&str]) -> Self {
        Self::new(ConstraintKind::PrimaryKey).columns(columns)
    }

    /// A UNIQUE constraint over `columns`.
    #[must_use]
    pub fn unique(columns: &[&str]) -> Self {
        Self::new(ConstraintKind::Unique).columns(columns)
    }

    /// A FOREIGN KEY from `columns` to `target`.
    #[must_use]
    pub fn foreign_key(columns: Vec<String>, target: ForeignKeyRef) -> Self {
        Self {
            columns,
            references: Some(target),
            ..Self::new(ConstraintKind::ForeignKey)
        }
    }

    /// A CHECK constraint with a raw SQL condition.
    #[must_use]
    pub fn check(condition: &str) -> Self {
        Self {
            check: Some(String::from(condition)),
            ..Self::new(ConstraintKind::Check)
        }
    }

    /// Names the constraint.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(String::from(name));
        self
    }

    /// Sets the constrained columns.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| String::from(*c)).collect();
        self
    }

    /// The kind tag.
    #[must_use]
    pub const fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// The constraint name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The constrained column names.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// The foreign key target, if any.
    #[must_use]
    pub const fn references(&self) -> Option<&ForeignKeyRef> {
        self.references.as_ref()
    }

    fn render_name(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        if let Some(name) = &self.name {
            w.append("CONSTRAINT ")?;
            w.append(name)?;
            w.append(" ")?;
        }
        Ok(())
    }

    fn render_check(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        w.append("CHECK (")?;
        w.append(self.check.as_deref().unwrap_or("TRUE"))?;
        w.append(")")
    }

    /// Renders the constraint inline after a column definition.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn render_column_level(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        self.render_name(w)?;
        match self.kind {
            ConstraintKind::NotNull => w.append("NOT NULL"),
            ConstraintKind::Unique => w.append("UNIQUE"),
            ConstraintKind::PrimaryKey => w.append("PRIMARY KEY"),
            ConstraintKind::ForeignKey => match &self.references {
                Some(target) => target.render(w),
                None => Ok(()),
            },
            ConstraintKind::Check => self.render_check(w),
        }
    }

    /// Renders the constraint as a table-level clause.
    ///
    /// A table-level NOT NULL becomes a CHECK on its columns.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn render_table_level(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        self.render_name(w)?;
        let columns = self.columns.join(", ");
        match self.kind {
            ConstraintKind::NotNull => {
                let checks: Vec<String> = self
                    .columns
                    .iter()
                    .map(|c| format!("{c} IS NOT NULL"))
                    .collect();
                w.append("CHECK (")?;
                w.append(&checks.join(" AND "))?;
                w.append(")")
            }
            ConstraintKind::Unique => {
                w.append("UNIQUE (")?;
                w.append(&columns)?;
                w.append(")")
            }
            ConstraintKind::PrimaryKey => {
                w.append("PRIMARY KEY (")?;
                w.append(&columns)?;
                w.append(")")
            }
            ConstraintKind::ForeignKey => {
                w.append("FOREIGN KEY (")?;
                w.append(&columns)?;
                w.append(")")?;
                if let Some(target) = &self.references {
                    w.append(" ")?;
                    target.render(w)?;
                }
                Ok(())
            }
            ConstraintKind::Check => self.render_check(w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DbSpec;

    fn table_level(constraint: &DbConstraint) -> String {
        let mut out = String::new();
        constraint
            .render_table_level(&mut SqlWriter::new(&mut out))
            .unwrap();
        out
    }

    fn column_level(constraint: &DbConstraint) -> String {
        let mut out = String::new();
        constraint
            .render_column_level(&mut SqlWriter::new(&mut out))
            .unwrap();
        out
    }

    #[test]
    fn test_table_level_constraints() {
        let mut spec = DbSpec::new();
        let customers = spec.add_table("customers");

        assert_eq!(
            table_level(&DbConstraint::primary_key(&["id", "region"]).named("pk_orders")),
            "CONSTRAINT pk_orders PRIMARY KEY (id, region)"
        );
        assert_eq!(
            table_level(&DbConstraint::foreign_key(
                vec![String::from("customer_id")],
                ForeignKeyRef::new(customers.table_ref(), &["id"])
                    .on_delete(ForeignKeyAction::Cascade),
            )),
            "FOREIGN KEY (customer_id) REFERENCES customers (id) ON DELETE CASCADE"
        );
        assert_eq!(
            table_level(&DbConstraint::new(ConstraintKind::NotNull).columns(&["a", "b"])),
            "CHECK (a IS NOT NULL AND b IS NOT NULL)"
        );
    }

    #[test]
    fn test_column_level_constraints() {
        assert_eq!(
            column_level(&DbConstraint::new(ConstraintKind::NotNull)),
            "NOT NULL"
        );
        assert_eq!(
            column_level(&DbConstraint::check("qty > 0").named("positive_qty")),
            "CONSTRAINT positive_qty CHECK (qty > 0)"
        );
    }
}
