//! Append-only arena owning every declaration of a compilation.
//!
//! The arena hands out stable indices so declarations can point at one
//! another through symbols without any ownership edges between nodes. Slots
//! are never freed; removal is a stage marker on the node, not a deallocation.

use std::marker::PhantomData;

/// Stable index into an [`Arena`].
pub struct ArenaIndex<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaIndex<T> {
    /// Construct a new index from a raw position.
    pub const fn from_raw(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Retrieve the raw index.
    pub const fn to_raw(self) -> usize {
        self.index
    }
}

impl<T> Clone for ArenaIndex<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaIndex<T> {}

impl<T> PartialEq for ArenaIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for ArenaIndex<T> {}

impl<T> std::fmt::Debug for ArenaIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArenaIndex({})", self.index)
    }
}

/// Vector-backed arena. Mutation goes through `&mut self`, which is how the
/// single writer of a stage is enforced.
#[derive(Debug)]
pub struct Arena<T> {
    entries: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Index the next call to [`Arena::alloc`] will return.
    pub fn next_index(&self) -> ArenaIndex<T> {
        ArenaIndex::from_raw(self.entries.len())
    }

    /// Allocate a new value in the arena and return its index.
    pub fn alloc(&mut self, value: T) -> ArenaIndex<T> {
        let index = self.next_index();
        self.entries.push(value);
        index
    }

    pub fn get(&self, index: ArenaIndex<T>) -> Option<&T> {
        self.entries.get(index.to_raw())
    }

    pub fn get_mut(&mut self, index: ArenaIndex<T>) -> Option<&mut T> {
        self.entries.get_mut(index.to_raw())
    }

    /// Iterate over the stored entries in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaIndex<T>, &T)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, value)| (ArenaIndex::from_raw(idx), value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    /// Number of elements currently allocated in the arena.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the arena contains no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
