//! Per-thread reentrancy guard.
//!
//! A provider may issue nested queries through the resolver it is handed.
//! Without a guard, a provider whose nested query reaches itself would
//! recurse forever. The guard records, per thread, which provider slots of
//! which resolver instance are currently executing; the resolver skips any
//! provider that is already active on the calling thread.
//!
//! Entries are keyed by `(resolver instance id, provider slot)` so two
//! independent resolvers on one thread never shadow each other's
//! providers. Activation hands back an RAII token; dropping it releases
//! the slot, which covers every exit path (normal return, provider error,
//! early continue) without an explicit `finally`.

use std::cell::RefCell;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

thread_local! {
    static ACTIVE: RefCell<HashSet<(u64, usize)>> = RefCell::new(HashSet::new());
}

static NEXT_RESOLVER_ID: AtomicU64 = AtomicU64::new(0);

/// One resolver's view of the thread-local activation set.
#[derive(Debug)]
pub(crate) struct ActivationSet {
    resolver: u64,
}

impl ActivationSet {
    /// Creates a set with a fresh resolver instance id.
    pub(crate) fn new() -> Self {
        Self {
            resolver: NEXT_RESOLVER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Returns `true` if `slot` is currently active on this thread.
    pub(crate) fn is_active(&self, slot: usize) -> bool {
        ACTIVE.with(|set| set.borrow().contains(&(self.resolver, slot)))
    }

    /// Activates `slot`, or returns `None` if it is already active on
    /// this thread.
    ///
    /// The slot is released when the returned token drops.
    pub(crate) fn try_activate(&self, slot: usize) -> Option<ActiveSlot> {
        let inserted = ACTIVE.with(|set| set.borrow_mut().insert((self.resolver, slot)));
        inserted.then_some(ActiveSlot {
            resolver: self.resolver,
            slot,
            _not_send: PhantomData,
        })
    }

    /// Returns `true` if no slot of this resolver is active on this
    /// thread.
    pub(crate) fn is_clear(&self) -> bool {
        ACTIVE.with(|set| !set.borrow().iter().any(|(r, _)| *r == self.resolver))
    }
}

/// RAII token for an active provider slot.
///
/// Deliberately `!Send`: the slot must be released on the thread that
/// activated it.
#[derive(Debug)]
pub(crate) struct ActiveSlot {
    resolver: u64,
    slot: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        ACTIVE.with(|set| {
            set.borrow_mut().remove(&(self.resolver, self.slot));
        });
    }
}
