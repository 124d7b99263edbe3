//! View handles and the content store render surfaces keep behind them.
//!
//! The presentation core only ever moves [`ViewId`]s around. Hosts register their real
//! content (widgets, strings, textures) in a [`ViewRegistry`] and resolve ids back to
//! content at draw time.

/// Opaque handle to renderable content.
///
/// Semantics:
/// - IDs are unique within the [`ViewRegistry`] that issued them.
/// - IDs are never reused for the lifetime of that registry.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ViewId(u64);

impl ViewId {
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Wraps a host-chosen identifier. Useful when content lives outside a `ViewRegistry`.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug)]
pub struct ViewRegistry<C> {
    entries: Vec<Option<C>>,
    next_id: u64,
}

impl<C> Default for ViewRegistry<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> ViewRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, content: C) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let idx = self.entries.len();
        debug_assert_eq!(idx as u64, id.raw());
        self.entries.push(Some(content));
        id
    }

    pub fn get(&self, id: ViewId) -> Option<&C> {
        let idx: usize = id.raw().try_into().ok()?;
        self.entries.get(idx).and_then(|entry| entry.as_ref())
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut C> {
        let idx: usize = id.raw().try_into().ok()?;
        self.entries.get_mut(idx).and_then(|entry| entry.as_mut())
    }

    /// Drops the content behind `id`. The id itself stays retired.
    pub fn remove(&mut self, id: ViewId) -> Option<C> {
        let idx: usize = id.raw().try_into().ok()?;
        self.entries.get_mut(idx).and_then(Option::take)
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
