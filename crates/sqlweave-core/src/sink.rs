//! Text sink nodes render into.
//!
//! [`SqlWriter`] wraps any [`fmt::Write`] and carries the render context
//! stack. Nodes append themselves directly, so deep trees never build
//! intermediate strings.

use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};

use tracing::{trace, warn};

use crate::context::{ContextToken, RenderContext};
use crate::error::RenderError;
use crate::node::SqlNode;

/// Output sink plus the stack of render contexts.
pub struct SqlWriter<'w> {
    out: &'w mut dyn fmt::Write,
    contexts: Vec<RenderContext>,
    track_positions: bool,
}

impl<'w> SqlWriter<'w> {
    /// Creates a writer starting from the default context.
    #[must_use]
    pub fn new(out: &'w mut dyn fmt::Write) -> Self {
        Self::with_context(out, RenderContext::new())
    }

    /// Creates a writer starting from `context`.
    #[must_use]
    pub fn with_context(out: &'w mut dyn fmt::Write, context: RenderContext) -> Self {
        Self {
            out,
            contexts: vec![context.with_depth(0)],
            track_positions: true,
        }
    }

    /// Creates a writer whose renders leave position trackers untouched.
    pub(crate) fn detached(out: &'w mut dyn fmt::Write) -> Self {
        Self {
            track_positions: false,
            ..Self::new(out)
        }
    }

    /// Whether trackers rendered into this writer record their position.
    #[must_use]
    pub const fn tracks_positions(&self) -> bool {
        self.track_positions
    }

    /// The innermost context.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        // the root context is never popped
        &self.contexts[self.contexts.len() - 1]
    }

    /// Mutable access to the innermost context.
    pub fn context_mut(&mut self) -> &mut RenderContext {
        let last = self.contexts.len() - 1;
        &mut self.contexts[last]
    }

    /// Pushes a copy of the innermost context.
    pub fn push_context(&mut self) -> ContextToken {
        let depth = self.contexts.len();
        let copy = self.context().clone().with_depth(depth);
        self.contexts.push(copy);
        trace!(depth, "pushed render context");
        ContextToken { depth }
    }

    /// Pops the context pushed by `token`, restoring its parent.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ContextMismatch`] if `token` does not belong
    /// to the innermost context.
    pub fn pop_context(&mut self, token: ContextToken) -> Result<(), RenderError> {
        let found = self.contexts.len() - 1;
        if token.depth == 0 {
            return Err(RenderError::ContextUnderflow);
        }
        if token.depth != found {
            return Err(RenderError::ContextMismatch {
                expected: token.depth,
                found,
            });
        }
        self.contexts.pop();
        trace!(depth = found, "popped render context");
        Ok(())
    }

    /// Pushes a context that is popped again when the guard drops.
    pub fn scoped(&mut self) -> ContextGuard<'_, 'w> {
        let token = self.push_context();
        ContextGuard {
            depth: token.depth,
            writer: self,
        }
    }

    /// Appends text.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying sink.
    pub fn append(&mut self, text: &str) -> Result<(), RenderError> {
        self.out.write_str(text)?;
        Ok(())
    }

    /// Appends a node by letting it render itself.
    ///
    /// # Errors
    ///
    /// Propagates any fault raised by the node.
    pub fn append_node(&mut self, node: &dyn SqlNode) -> Result<(), RenderError> {
        node.render(self)
    }

    /// Appends the characters `[start, end)` of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ReversedRange`] if `start > end` and
    /// [`RenderError::RangeOutOfBounds`] if `end` lies beyond the text. An
    /// empty range appends nothing and is not bounds checked.
    pub fn append_range(&mut self, text: &str, start: usize, end: usize) -> Result<(), RenderError> {
        if start > end {
            return Err(RenderError::ReversedRange { start, end });
        }
        if start == end {
            return Ok(());
        }
        let len = text.chars().count();
        if end > len {
            return Err(RenderError::RangeOutOfBounds { start, end, len });
        }
        self.append(char_slice(text, start, end))
    }

    /// Appends the characters `[start, end)` of what `node` renders.
    ///
    /// The node renders against a filtering sink that forwards only the
    /// requested characters; no copy of the full text is made. The node
    /// length is only known once it has rendered, so an `end` beyond it is
    /// reported after the fact. An empty range does not render the node at
    /// all, so no tracker is consumed, and is not bounds checked.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ReversedRange`] if `start > end`,
    /// [`RenderError::RangeOutOfBounds`] if `end` lies beyond the rendered
    /// text, and propagates node faults.
    pub fn append_node_range(
        &mut self,
        node: &dyn SqlNode,
        start: usize,
        end: usize,
    ) -> Result<(), RenderError> {
        if start > end {
            return Err(RenderError::ReversedRange { start, end });
        }
        if start == end {
            return Ok(());
        }

        let mut filter = RangeFilter {
            inner: &mut *self.out,
            position: 0,
            start,
            end,
        };
        let mut sub = SqlWriter {
            out: &mut filter,
            contexts: mem::take(&mut self.contexts),
            track_positions: self.track_positions,
        };
        let result = node.render(&mut sub);
        let SqlWriter { contexts, .. } = sub;
        self.contexts = contexts;
        result?;

        let len = filter.position;
        if end > len {
            return Err(RenderError::RangeOutOfBounds { start, end, len });
        }
        Ok(())
    }
}

impl fmt::Write for SqlWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.write_str(s)
    }
}

/// Scoped context push; pops on drop.
///
/// Dereferences to the writer so the body renders straight through it.
pub struct ContextGuard<'a, 'w> {
    writer: &'a mut SqlWriter<'w>,
    depth: usize,
}

impl<'w> Deref for ContextGuard<'_, 'w> {
    type Target = SqlWriter<'w>;

    fn deref(&self) -> &Self::Target {
        self.writer
    }
}

impl DerefMut for ContextGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.writer
    }
}

impl Drop for ContextGuard<'_, '_> {
    fn drop(&mut self) {
        let found = self.writer.contexts.len() - 1;
        if found != self.depth {
            warn!(
                expected = self.depth,
                found, "abandoning render contexts left pushed inside a scope"
            );
        }
        self.writer.contexts.truncate(self.depth);
        trace!(depth = self.depth, "popped render context");
    }
}

/// Forwards only the characters in `[start, end)` of everything written.
struct RangeFilter<'a, W: fmt::Write + ?Sized> {
    inner: &'a mut W,
    position: usize,
    start: usize,
    end: usize,
}

impl<W: fmt::Write + ?Sized> fmt::Write for RangeFilter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let chunk_start = self.position;
        let chunk_len = s.chars().count();
        self.position += chunk_len;

        let from = self.start.max(chunk_start);
        let to = self.end.min(self.position);
        if from >= to {
            return Ok(());
        }
        self.inner
            .write_str(char_slice(s, from - chunk_start, to - chunk_start))
    }
}

/// Slices `s` by character offsets.
fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let byte_at = |n: usize| s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    &s[byte_at(from)..byte_at(to)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CustomSql;

    fn range_of(node: &dyn SqlNode, start: usize, end: usize) -> Result<String, RenderError> {
        let mut out = String::new();
        let mut w = SqlWriter::new(&mut out);
        w.append_node_range(node, start, end)?;
        Ok(out)
    }

    #[test]
    fn test_node_range_matches_slice() {
        let node = CustomSql::new("0123456789");
        for start in 0..=10 {
            for end in start..=10 {
                assert_eq!(range_of(&node, start, end).unwrap(), &"0123456789"[start..end]);
            }
        }
    }

    #[test]
    fn test_node_range_spanning_chunks() {
        struct Chunks;
        impl SqlNode for Chunks {
            fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
                w.append("SEL")?;
                w.append("ECT ")?;
                w.append("é*")
            }
        }
        assert_eq!(range_of(&Chunks, 2, 5).unwrap(), "LEC");
        assert_eq!(range_of(&Chunks, 6, 8).unwrap(), " é");
        assert_eq!(range_of(&Chunks, 0, 9).unwrap(), "SELECT é*");
    }

    #[test]
    fn test_node_range_out_of_bounds() {
        let node = CustomSql::new("abc");
        assert!(matches!(
            range_of(&node, 1, 5),
            Err(RenderError::RangeOutOfBounds { start: 1, end: 5, len: 3 })
        ));
        assert!(matches!(
            range_of(&node, 2, 1),
            Err(RenderError::ReversedRange { start: 2, end: 1 })
        ));
    }

    #[test]
    fn test_empty_range_is_noop_for_text_and_nodes() {
        let node = CustomSql::new("abc");
        assert_eq!(range_of(&node, 3, 3).unwrap(), "");
        assert_eq!(range_of(&node, 7, 7).unwrap(), "");

        let mut out = String::new();
        let mut w = SqlWriter::new(&mut out);
        w.append_range("abc", 7, 7).unwrap();
        assert!(matches!(
            w.append_range("abc", 7, 6),
            Err(RenderError::ReversedRange { start: 7, end: 6 })
        ));
        assert!(matches!(
            w.append_range("abc", 1, 7),
            Err(RenderError::RangeOutOfBounds { start: 1, end: 7, len: 3 })
        ));
        assert_eq!(out, "");
    }

    #[test]
    fn test_empty_node_range_leaves_trackers_unassigned() {
        let session = crate::params::ParameterSession::default();
        let placeholder = session.placeholder();
        assert_eq!(range_of(&placeholder, 0, 0).unwrap(), "");
        assert_eq!(placeholder.index(), None);
        assert_eq!(session.next_index(), 1);
    }

    #[test]
    fn test_text_range() {
        let mut out = String::new();
        let mut w = SqlWriter::new(&mut out);
        w.append_range("héllo", 1, 4).unwrap();
        assert!(w.append_range("abc", 0, 4).is_err());
        assert!(matches!(
            w.append_range("abc", 2, 1),
            Err(RenderError::ReversedRange { start: 2, end: 1 })
        ));
        assert_eq!(out, "éll");
    }

    #[test]
    fn test_push_pop_restores_parent() {
        let mut out = String::new();
        let mut w = SqlWriter::new(&mut out);
        let token = w.push_context();
        w.context_mut().use_table_aliases = false;
        assert_eq!(w.context().depth(), 1);
        w.pop_context(token).unwrap();
        assert!(w.context().use_table_aliases);
        assert_eq!(w.context().depth(), 0);
    }

    #[test]
    fn test_mismatched_pop_faults() {
        let mut out = String::new();
        let mut w = SqlWriter::new(&mut out);
        let outer = w.push_context();
        let _inner = w.push_context();
        assert!(matches!(
            w.pop_context(outer),
            Err(RenderError::ContextMismatch {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn test_scoped_guard_pops_on_drop() {
        let mut out = String::new();
        let mut w = SqlWriter::new(&mut out);
        {
            let mut guard = w.scoped();
            guard.context_mut().use_table_constraints = false;
            {
                let inner = guard.scoped();
                assert_eq!(inner.context().depth(), 2);
                assert!(!inner.context().use_table_constraints);
            }
            assert_eq!(guard.context().depth(), 1);
        }
        assert_eq!(w.context().depth(), 0);
        assert!(w.context().use_table_constraints);
    }

    #[test]
    fn test_range_keeps_context_stack() {
        let mut out = String::new();
        let mut w = SqlWriter::new(&mut out);
        let mut guard = w.scoped();
        guard.context_mut().use_table_aliases = false;
        guard
            .append_node_range(&CustomSql::new("xyz"), 0, 2)
            .unwrap();
        assert!(!guard.context().use_table_aliases);
        assert_eq!(guard.context().depth(), 1);
    }
}
