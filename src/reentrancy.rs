//! Debug-only reentrancy tracker for the slot store.
//!
//! The store calls into user code only through `K: Eq + Hash` while it
//! probes its index. A key whose `eq` or `hash` reaches back into the same
//! store would observe it half-updated, so every store entry point holds a
//! `ProbeGuard` for its duration. Debug builds panic on a nested entry;
//! release builds compile the tracker away.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct ProbeTracker {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // !Sync in every build: concurrent readers would trip the tracker.
    _unsync: PhantomData<Cell<()>>,
}

impl Clone for ProbeTracker {
    // A clone is a fresh store; it never inherits an in-flight probe.
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl ProbeTracker {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _unsync: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn enter(&self) -> ProbeGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "reentrancy detected: key Eq/Hash called back into the store"
            );
            ProbeGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ProbeGuard { _owner: PhantomData }
        }
    }
}

/// Released on drop.
pub(crate) struct ProbeGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ProbeTracker,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ()>,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.busy.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::ProbeTracker;

    #[test]
    fn sequential_entries_are_fine() {
        let t = ProbeTracker::new();
        drop(t.enter());
        drop(t.enter());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_in_debug() {
        let t = ProbeTracker::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = t.enter();
            let _inner = t.enter();
        }));
        assert!(res.is_err(), "expected nested entry to panic in debug builds");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn clone_does_not_inherit_busy_state() {
        let t = ProbeTracker::new();
        let _held = t.enter();
        let c = t.clone();
        let _g = c.enter();
    }
}
