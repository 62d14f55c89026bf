//! Render and session configuration.

use serde::{Deserialize, Serialize};

use crate::context::RenderContext;

/// Settings of the outermost render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Qualify columns with table aliases.
    pub use_table_aliases: bool,
    /// Render constraints in DDL statements.
    pub use_table_constraints: bool,
}

impl RenderOptions {
    /// Creates the default options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            use_table_aliases: true,
            use_table_constraints: true,
        }
    }

    /// Sets whether table aliases are used.
    #[must_use]
    pub const fn table_aliases(mut self, enabled: bool) -> Self {
        self.use_table_aliases = enabled;
        self
    }

    /// Sets whether constraints are rendered.
    #[must_use]
    pub const fn table_constraints(mut self, enabled: bool) -> Self {
        self.use_table_constraints = enabled;
        self
    }

    /// Builds the outermost render context.
    #[must_use]
    pub fn to_context(&self) -> RenderContext {
        let mut context = RenderContext::new();
        context.use_table_aliases = self.use_table_aliases;
        context.use_table_constraints = self.use_table_constraints;
        context
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings shared by parameter and column sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Position handed to the first tracker rendered.
    pub start_index: usize,
}

impl SessionOptions {
    /// Creates options starting at position 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { start_index: 1 }
    }

    /// Sets the first position.
    #[must_use]
    pub const fn start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_partial_json() {
        let options: RenderOptions =
            serde_json::from_str(r#"{"use_table_aliases": false}"#).unwrap();
        assert!(!options.use_table_aliases);
        assert!(options.use_table_constraints);

        let context = options.to_context();
        assert!(!context.use_table_aliases);
    }

    #[test]
    fn test_session_options_default() {
        let options: SessionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.start_index, 1);
        assert_eq!(SessionOptions::new().start_index(5).start_index, 5);
    }
}
