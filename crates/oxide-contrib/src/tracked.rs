//! Explicit change tracking.
//!
//! A [`Tracked`] value pairs an entity with a dirty flag. It starts clean
//! when read from the database; any mutable access marks it dirty, and
//! [`crate::Repository::update_tracked`] skips clean values without
//! issuing SQL.

use std::ops::{Deref, DerefMut};

/// An entity plus a flag recording whether it was mutated since it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    entity: T,
    dirty: bool,
}

impl<T> Tracked<T> {
    /// Wraps a freshly read entity as clean.
    #[must_use]
    pub const fn new(entity: T) -> Self {
        Self {
            entity,
            dirty: false,
        }
    }

    /// Returns whether the entity was mutated.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the entity as changed without touching it.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Marks the entity as in sync with the database.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Unwraps the entity, discarding the flag.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_keep_clean_writes_mark_dirty() {
        let mut tracked = Tracked::new(String::from("a"));
        assert_eq!(tracked.len(), 1);
        assert!(!tracked.is_dirty());

        tracked.push('b');
        assert!(tracked.is_dirty());

        tracked.mark_clean();
        assert!(!tracked.is_dirty());
        assert_eq!(tracked.into_inner(), "ab");
    }
}
