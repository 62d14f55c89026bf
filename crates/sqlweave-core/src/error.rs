//! Error types for rendering, validation, binding and reading.

use std::fmt;

use thiserror::Error;

use crate::node::{self, SqlNode};
use crate::value::SqlType;

/// Faults that abort a render.
///
/// These are programmer errors: the partially written output must be
/// discarded and the context stack of the aborted render is abandoned.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A sub-range request does not fit the rendered text.
    #[error("invalid range [{start}, {end}) for text of length {len}")]
    RangeOutOfBounds {
        /// Requested start (inclusive).
        start: usize,
        /// Requested end (exclusive).
        end: usize,
        /// Length of the text, in characters.
        len: usize,
    },

    /// A sub-range whose start lies after its end.
    #[error("invalid range [{start}, {end}): start is after end")]
    ReversedRange {
        /// Requested start (inclusive).
        start: usize,
        /// Requested end (exclusive).
        end: usize,
    },

    /// A context was popped while it was not the innermost one.
    #[error("render context mismatch: popping depth {expected} but the innermost context is at depth {found}")]
    ContextMismatch {
        /// Depth carried by the token being popped.
        expected: usize,
        /// Depth of the innermost context.
        found: usize,
    },

    /// Attempt to pop the root context.
    #[error("render context stack underflow")]
    ContextUnderflow,

    /// A single-use tracker was rendered a second time.
    #[error("tracker already occupies position {position}")]
    TrackerReused {
        /// Position recorded by the first render.
        position: usize,
    },

    /// A multi-use tracker was asked for its single index but recorded several.
    #[error("tracker occupies several positions {positions:?}")]
    AmbiguousIndex {
        /// All recorded positions.
        positions: Vec<usize>,
    },

    /// The underlying sink failed.
    #[error("sink error: {0}")]
    Fmt(#[from] fmt::Error),
}

/// A failed semantic check.
///
/// Carries the message and, when it could be produced, the rendered text
/// of the node that failed the check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", .node.as_deref().map(|n| format!(" [{n}]")).unwrap_or_default())]
pub struct ValidationError {
    message: String,
    node: Option<String>,
}

impl ValidationError {
    /// Creates an error without an offending node.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            node: None,
        }
    }

    /// Creates an error pointing at `node`.
    ///
    /// The node text is rendered without touching any position tracker;
    /// if that render fails the text is simply left out.
    #[must_use]
    pub fn for_node(message: impl Into<String>, node: &dyn SqlNode) -> Self {
        Self {
            message: message.into(),
            node: node::render_detached(node),
        }
    }

    /// Points an error raised without a node at `node`.
    #[must_use]
    pub fn at(mut self, node: &dyn SqlNode) -> Self {
        if self.node.is_none() {
            self.node = node::render_detached(node);
        }
        self
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rendered text of the offending node, if available.
    #[must_use]
    pub fn node_text(&self) -> Option<&str> {
        self.node.as_deref()
    }
}

/// Faults raised while binding parameters.
///
/// Binding an unassigned placeholder is not a fault; it is skipped.
#[derive(Debug, Error)]
pub enum BindError {
    /// Two values were bound at the same position.
    #[error("parameter position {0} bound twice")]
    DuplicatePosition(usize),

    /// No value was bound at a position the statement uses.
    #[error("no value bound at parameter position {0}")]
    MissingPosition(usize),

    /// The binding target rejected the value.
    #[error("binding target error: {0}")]
    Target(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Faults raised while reading a result row.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The column never appeared in a rendered statement.
    #[error("column is not part of the rendered statement")]
    NotInStatement,

    /// The row has no column at this position.
    #[error("no column at position {0}")]
    NoSuchColumn(usize),

    /// The value at this position has another type.
    #[error("column {index} holds {found:?}, expected {expected:?}")]
    TypeMismatch {
        /// Position read.
        index: usize,
        /// Requested type.
        expected: SqlType,
        /// Type found in the row.
        found: SqlType,
    },

    /// The row source failed.
    #[error("row source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}
