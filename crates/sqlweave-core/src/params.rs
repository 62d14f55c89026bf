//! Placeholders that remember where they were rendered.
//!
//! A [`ParameterSession`] owns a position counter. Every placeholder it
//! hands out renders as `?` and, the first time it is rendered, takes the
//! next position from that counter. Values are bound afterwards by
//! position, once the final layout of the statement is known.
//!
//! A statement containing single-use placeholders can be rendered only
//! once; rendering it again is a [`RenderError::TrackerReused`] fault.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, trace};

use crate::error::{BindError, RenderError};
use crate::node::SqlNode;
use crate::options::SessionOptions;
use crate::sink::SqlWriter;
use crate::value::{SqlType, SqlValue, ToSqlValue};

/// Marker written for every placeholder.
pub const PLACEHOLDER: &str = "?";

/// Receiver of bound parameter values.
pub trait ParameterTarget {
    /// Binds a value at `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] if the target rejects the value.
    fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<(), BindError>;

    /// Binds an absent value of the declared type at `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] if the target rejects the value.
    fn set_null(&mut self, index: usize, sql_type: SqlType) -> Result<(), BindError>;
}

fn bind_at(
    target: &mut dyn ParameterTarget,
    index: usize,
    value: &SqlValue,
    null_type: SqlType,
) -> Result<(), BindError> {
    trace!(index, "binding parameter");
    if value.is_null() {
        target.set_null(index, null_type)
    } else {
        target.set_value(index, value)
    }
}

/// Hands out placeholders sharing one position counter.
#[derive(Debug)]
pub struct ParameterSession {
    counter: Arc<AtomicUsize>,
    statics: Vec<StaticPlaceholder>,
}

impl ParameterSession {
    /// Creates a session whose first placeholder gets `start_index`.
    #[must_use]
    pub fn new(start_index: usize) -> Self {
        Self {
            counter: Arc::new(AtomicUsize::new(start_index)),
            statics: Vec::new(),
        }
    }

    /// Creates a session from options.
    #[must_use]
    pub fn with_options(options: &SessionOptions) -> Self {
        Self::new(options.start_index)
    }

    /// A placeholder occupying exactly one position.
    #[must_use]
    pub fn placeholder(&self) -> Placeholder {
        Placeholder {
            state: Arc::new(PlaceholderState {
                counter: Arc::clone(&self.counter),
                position: OnceLock::new(),
            }),
        }
    }

    /// A placeholder that may appear several times in one statement.
    #[must_use]
    pub fn multi_placeholder(&self) -> MultiPlaceholder {
        MultiPlaceholder {
            state: Arc::new(MultiState {
                counter: Arc::clone(&self.counter),
                positions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A placeholder carrying its value, bound by [`Self::bind_all`].
    ///
    /// The type tag is taken from the value; a NULL gets [`SqlType::Null`].
    pub fn static_placeholder<T: ToSqlValue>(&mut self, value: T) -> StaticPlaceholder {
        let value = value.to_sql_value();
        let sql_type = value.sql_type();
        self.static_placeholder_typed(value, sql_type)
    }

    /// A placeholder carrying its value and an explicit type tag.
    pub fn static_placeholder_typed<T: ToSqlValue>(
        &mut self,
        value: T,
        sql_type: SqlType,
    ) -> StaticPlaceholder {
        let placeholder = StaticPlaceholder {
            placeholder: self.placeholder(),
            value: Arc::new(value.to_sql_value()),
            sql_type,
        };
        self.statics.push(placeholder.clone());
        placeholder
    }

    /// The position the next rendered placeholder will get.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    /// Binds every static placeholder that was rendered.
    ///
    /// # Errors
    ///
    /// Returns the first [`BindError`] raised by the target.
    pub fn bind_all(&self, target: &mut dyn ParameterTarget) -> Result<(), BindError> {
        for placeholder in &self.statics {
            placeholder.bind(target)?;
        }
        debug!(count = self.statics.len(), "bound static placeholders");
        Ok(())
    }
}

impl Default for ParameterSession {
    fn default() -> Self {
        Self::with_options(&SessionOptions::default())
    }
}

#[derive(Debug)]
struct PlaceholderState {
    counter: Arc<AtomicUsize>,
    position: OnceLock<usize>,
}

/// Single-use placeholder.
///
/// Clones share state, so one clone can sit in the tree while another is
/// kept for binding.
#[derive(Debug, Clone)]
pub struct Placeholder {
    state: Arc<PlaceholderState>,
}

impl Placeholder {
    /// The recorded position, or `None` if never rendered.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.state.position.get().copied()
    }

    /// Whether the placeholder was rendered into the statement.
    #[must_use]
    pub fn is_in_statement(&self) -> bool {
        self.index().is_some()
    }

    /// Binds `value` at the recorded position.
    ///
    /// Does nothing if the placeholder is not in the statement.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] if the target rejects the value.
    pub fn bind<T: ToSqlValue>(
        &self,
        target: &mut dyn ParameterTarget,
        value: T,
    ) -> Result<(), BindError> {
        let value = value.to_sql_value();
        self.bind_value(target, &value, value.sql_type())
    }

    /// Binds an absent value of `sql_type` at the recorded position.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] if the target rejects the value.
    pub fn bind_null(
        &self,
        target: &mut dyn ParameterTarget,
        sql_type: SqlType,
    ) -> Result<(), BindError> {
        self.bind_value(target, &SqlValue::Null, sql_type)
    }

    fn bind_value(
        &self,
        target: &mut dyn ParameterTarget,
        value: &SqlValue,
        null_type: SqlType,
    ) -> Result<(), BindError> {
        match self.index() {
            Some(index) => bind_at(target, index, value, null_type),
            None => {
                debug!("skipping placeholder not in statement");
                Ok(())
            }
        }
    }
}

impl SqlNode for Placeholder {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        if w.tracks_positions() {
            if let Some(&position) = self.state.position.get() {
                return Err(RenderError::TrackerReused { position });
            }
            let next = self.state.counter.fetch_add(1, Ordering::SeqCst);
            if let Err(position) = self.state.position.set(next) {
                return Err(RenderError::TrackerReused { position });
            }
            trace!(position = next, "placeholder assigned");
        }
        w.append(PLACEHOLDER)
    }
}

#[derive(Debug)]
struct MultiState {
    counter: Arc<AtomicUsize>,
    positions: Mutex<Vec<usize>>,
}

/// Placeholder recording one position per occurrence.
#[derive(Debug, Clone)]
pub struct MultiPlaceholder {
    state: Arc<MultiState>,
}

impl MultiPlaceholder {
    /// All recorded positions, in render order.
    #[must_use]
    pub fn positions(&self) -> Vec<usize> {
        self.state
            .positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The single recorded position.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AmbiguousIndex`] if more than one position was
    /// recorded.
    pub fn index(&self) -> Result<Option<usize>, RenderError> {
        let positions = self.positions();
        match positions.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            _ => Err(RenderError::AmbiguousIndex { positions }),
        }
    }

    /// Whether the placeholder was rendered at least once.
    #[must_use]
    pub fn is_in_statement(&self) -> bool {
        !self.positions().is_empty()
    }

    /// Binds `value` at every recorded position.
    ///
    /// # Errors
    ///
    /// Returns the first [`BindError`] raised by the target.
    pub fn bind<T: ToSqlValue>(
        &self,
        target: &mut dyn ParameterTarget,
        value: T,
    ) -> Result<(), BindError> {
        let value = value.to_sql_value();
        let null_type = value.sql_type();
        for index in self.positions() {
            bind_at(target, index, &value, null_type)?;
        }
        Ok(())
    }

    /// Binds an absent value of `sql_type` at every recorded position.
    ///
    /// # Errors
    ///
    /// Returns the first [`BindError`] raised by the target.
    pub fn bind_null(
        &self,
        target: &mut dyn ParameterTarget,
        sql_type: SqlType,
    ) -> Result<(), BindError> {
        for index in self.positions() {
            target.set_null(index, sql_type)?;
        }
        Ok(())
    }
}

impl SqlNode for MultiPlaceholder {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        if w.tracks_positions() {
            let next = self.state.counter.fetch_add(1, Ordering::SeqCst);
            self.state
                .positions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(next);
            trace!(position = next, "multi placeholder assigned");
        }
        w.append(PLACEHOLDER)
    }
}

/// Placeholder bundled with the value it binds.
#[derive(Debug, Clone)]
pub struct StaticPlaceholder {
    placeholder: Placeholder,
    value: Arc<SqlValue>,
    sql_type: SqlType,
}

impl StaticPlaceholder {
    /// The captured value.
    #[must_use]
    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    /// The declared type tag.
    #[must_use]
    pub const fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// The recorded position, or `None` if never rendered.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.placeholder.index()
    }

    /// Whether the placeholder was rendered into the statement.
    #[must_use]
    pub fn is_in_statement(&self) -> bool {
        self.placeholder.is_in_statement()
    }

    /// Binds the captured value at the recorded position.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] if the target rejects the value.
    pub fn bind(&self, target: &mut dyn ParameterTarget) -> Result<(), BindError> {
        self.placeholder
            .bind_value(target, &self.value, self.sql_type)
    }
}

impl SqlNode for StaticPlaceholder {
    fn render(&self, w: &mut SqlWriter<'_>) -> Result<(), RenderError> {
        self.placeholder.render(w)
    }
}

/// A value bound at one position.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// A present value.
    Value(SqlValue),
    /// An absent value of a declared type.
    Null(SqlType),
}

/// In-memory [`ParameterTarget`] keyed by position.
#[derive(Debug, Default, Clone)]
pub struct BoundParameters {
    values: BTreeMap<usize, Bound>,
}

impl BoundParameters {
    /// Creates an empty set of bound values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value bound at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Bound> {
        self.values.get(&index)
    }

    /// Number of bound positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the values in position order, starting at `start_index`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::MissingPosition`] for the first gap.
    pub fn into_ordered(self, start_index: usize) -> Result<Vec<Bound>, BindError> {
        let mut ordered = Vec::with_capacity(self.values.len());
        for (expected, (index, bound)) in (start_index..).zip(self.values) {
            if index != expected {
                return Err(BindError::MissingPosition(expected));
            }
            ordered.push(bound);
        }
        Ok(ordered)
    }

    fn insert(&mut self, index: usize, bound: Bound) -> Result<(), BindError> {
        if self.values.insert(index, bound).is_some() {
            return Err(BindError::DuplicatePosition(index));
        }
        Ok(())
    }
}

impl ParameterTarget for BoundParameters {
    fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<(), BindError> {
        self.insert(index, Bound::Value(value.clone()))
    }

    fn set_null(&mut self, index: usize, sql_type: SqlType) -> Result<(), BindError> {
        self.insert(index, Bound::Null(sql_type))
    }
}
