//! Variable-binding frames and frame sets.
//!
//! A frame is an immutable mapping from binding names to values: one
//! candidate completion of a rule's pattern. Frames are only ever extended,
//! never overwritten; attempting to rebind a name to a different value is a
//! unification failure and silently discards the candidate.
//!
//! Frames are persistent maps so fan-out during joins shares structure
//! instead of aliasing mutable state.

use std::sync::Arc;

use weft_foundation::{Record, Value, WfMap};

// =============================================================================
// Frame
// =============================================================================

/// An immutable set of mutually consistent variable bindings.
///
/// The fresh empty frame is the identity element for joins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    bindings: WfMap<Arc<str>, Value>,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no names are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Gets a binding by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Returns true if the name is bound.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Extends the frame with a binding, unifying with any existing one.
    ///
    /// Returns the extended frame, or `None` if the name is already bound
    /// to a different value (unification failure — expected control flow,
    /// never an error).
    #[must_use]
    pub fn bind(&self, name: impl Into<Arc<str>>, value: Value) -> Option<Self> {
        let name = name.into();
        match self.bindings.get(&*name) {
            Some(existing) if *existing == value => Some(self.clone()),
            Some(_) => None,
            None => Some(Self {
                bindings: self.bindings.insert(name, value),
            }),
        }
    }

    /// Merges a record's fields into the frame under the record's own field
    /// names, unifying each. Returns `None` on any conflict.
    #[must_use]
    pub fn merge_record(&self, record: &Record) -> Option<Self> {
        let mut frame = self.clone();
        for (name, value) in record.iter() {
            frame = frame.bind(Arc::clone(name), value.clone())?;
        }
        Some(frame)
    }

    /// Iterates all bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.bindings.iter()
    }
}

// =============================================================================
// Frame Set
// =============================================================================

/// An ordered sequence of independent candidate frames for one rule
/// evaluation.
///
/// Order is insertion order from the join source; it carries no meaning
/// beyond making side-effect ordering deterministic.
#[derive(Clone, Debug, Default)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    /// Creates an empty frame set (annihilates any rule firing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frame set containing the single empty frame (the join
    /// identity).
    #[must_use]
    pub fn unit() -> Self {
        Self {
            frames: vec![Frame::new()],
        }
    }

    /// Creates a frame set from a single frame.
    #[must_use]
    pub fn from_frame(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
        }
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if no frames remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Appends a frame.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Iterates the frames in order.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Expands every frame into zero or more frames (join fan-out).
    ///
    /// Pure: the input set is untouched; output order is input order with
    /// each frame's expansions in the order the expander produced them.
    #[must_use]
    pub fn expand<F>(&self, mut expander: F) -> Self
    where
        F: FnMut(&Frame) -> Vec<Frame>,
    {
        let mut out = Self::new();
        for frame in &self.frames {
            out.frames.extend(expander(frame));
        }
        out
    }

    /// Keeps only the frames satisfying the predicate (pure narrowing).
    #[must_use]
    pub fn retain<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Frame) -> bool,
    {
        Self {
            frames: self
                .frames
                .iter()
                .filter(|f| predicate(f))
                .cloned()
                .collect(),
        }
    }
}

impl FromIterator<Frame> for FrameSet {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FrameSet {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

// =============================================================================
// Tests
// =============================================================================
