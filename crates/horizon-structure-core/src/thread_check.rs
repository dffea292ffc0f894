//! Thread affinity verification for single-writer state.
//!
//! The structure engine is not internally synchronized: it is created on one
//! thread and must only be mutated from that thread. [`ThreadAffinity`]
//! records the owning thread and provides assertions that catch violations.
//!
//! Two levels of checking are provided:
//!
//! - [`ThreadAffinity::debug_assert_same_thread`]: Only active in debug builds.
//!   Use these liberally on every mutating entry point.
//! - [`ThreadAffinity::assert_same_thread`]: Always active.
//!
//! # Example
//!
//! ```
//! use horizon_structure_core::thread_check::ThreadAffinity;
//!
//! struct Model {
//!     affinity: ThreadAffinity,
//!     value: std::cell::Cell<i32>,
//! }
//!
//! impl Model {
//!     fn new() -> Self {
//!         Self {
//!             affinity: ThreadAffinity::current(),
//!             value: std::cell::Cell::new(0),
//!         }
//!     }
//!
//!     fn set_value(&self, v: i32) {
//!         self.affinity.debug_assert_same_thread();
//!         self.value.set(v);
//!     }
//! }
//! ```

use std::thread::ThreadId;

/// Thread affinity tracker.
///
/// Records the thread on which a value was created.
#[derive(Debug, Clone, Copy)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl ThreadAffinity {
    /// Create an affinity bound to the current thread.
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// The owning thread.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Whether the current thread is the owning thread.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Panics if called from a thread other than the owner.
    #[track_caller]
    pub fn assert_same_thread(&self) {
        if !self.is_same_thread() {
            panic_wrong_thread(self.thread_id, std::panic::Location::caller());
        }
    }

    /// Debug-only variant of [`assert_same_thread`](Self::assert_same_thread).
    #[inline]
    #[track_caller]
    pub fn debug_assert_same_thread(&self) {
        #[cfg(debug_assertions)]
        self.assert_same_thread();
    }
}

#[cold]
#[inline(never)]
fn panic_wrong_thread(owner: ThreadId, location: &std::panic::Location<'_>) -> ! {
    let current = std::thread::current();
    let current_name = current.name().unwrap_or("<unnamed>");

    panic!(
        "\n\
        ══════════════════════════════════════════════════════════════════════\n\
        THREAD AFFINITY VIOLATION\n\
        ══════════════════════════════════════════════════════════════════════\n\
        \n\
        Location: {location}\n\
        Current thread: \"{current_name}\" (ID: {current_id:?})\n\
        Owning thread ID: {owner:?}\n\
        \n\
        Single-writer state was touched from a foreign thread. Post the work\n\
        through a DispatchSender and process it on the owning thread:\n\
        \n\
           sender.send(delta)?;            // any thread\n\
           engine.process_pending()?;      // owning thread\n\
        \n\
        ══════════════════════════════════════════════════════════════════════",
        current_id = current.id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_thread() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_same_thread());
        affinity.assert_same_thread();
        affinity.debug_assert_same_thread();
    }

    #[test]
    fn test_other_thread_detected() {
        let affinity = ThreadAffinity::current();
        let same = std::thread::spawn(move || affinity.is_same_thread())
            .join()
            .unwrap();
        assert!(!same);
    }

    #[test]
    fn test_assert_panics_on_other_thread() {
        let affinity = ThreadAffinity::current();
        let result = std::thread::spawn(move || affinity.assert_same_thread()).join();
        assert!(result.is_err());
    }
}
