//! Re-entrancy tracking for recursive walks over model graphs.
//!
//! Model graphs may contain cycles. Each recursive walk (validation,
//! encoding, debug formatting) marks the instance it is visiting for the
//! current thread; a second visit to a marked instance on the same path is
//! a cycle.

use std::cell::RefCell;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Walk {
    Validate,
    Encode,
    Format,
}

thread_local! {
    static ACTIVE: RefCell<HashSet<(usize, Walk)>> = RefCell::new(HashSet::new());
}

/// Marks an instance as visited until dropped.
pub(crate) struct WalkGuard {
    key: (usize, Walk),
}

impl WalkGuard {
    /// Returns `None` if the instance is already being walked on this thread.
    pub(crate) fn enter(addr: usize, walk: Walk) -> Option<Self> {
        let key = (addr, walk);
        ACTIVE
            .with(|active| active.borrow_mut().insert(key))
            .then_some(Self { key })
    }
}

impl Drop for WalkGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().remove(&self.key);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_entry_is_refused_until_drop() {
        let first = WalkGuard::enter(0x10, Walk::Encode);
        assert!(first.is_some());
        assert!(WalkGuard::enter(0x10, Walk::Encode).is_none());
        assert!(WalkGuard::enter(0x10, Walk::Validate).is_some());
        drop(first);
        assert!(WalkGuard::enter(0x10, Walk::Encode).is_some());
    }
}
