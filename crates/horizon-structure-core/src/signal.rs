//! Typed signal primitive for synchronous change notification.
//!
//! A [`Signal<Args>`] holds a set of connected slots (closures). Emitting the
//! signal invokes every slot, in connection order, on the emitting thread.
//! The structure tree uses one signal per notification kind so that a view
//! can subscribe only to what it renders.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal itself
//! - [`ConnectionId`] - Identifier returned when connecting a slot
//! - [`ConnectionGuard`] - Disconnects its slot when dropped
//!
//! # Blocking
//!
//! A signal can be temporarily blocked with [`Signal::set_blocked`]. While
//! blocked, `emit` is a no-op. The tree uses this to suppress the
//! intermediate remove/insert pair while it moves a node to a new position,
//! and reports the move as a single reorder instead.
//!
//! # Re-entrancy
//!
//! Slots are cloned out of the connection table before they run, so a slot
//! may connect or disconnect other slots without deadlocking.
//!
//! # Example
//!
//! ```
//! use horizon_structure_core::Signal;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let inserted = Signal::<(u32, usize)>::new();
//! let count = Arc::new(AtomicUsize::new(0));
//!
//! let count_clone = count.clone();
//! inserted.connect(move |(_parent, _index)| {
//!     count_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! inserted.emit((1, 0));
//! assert_eq!(count.load(Ordering::SeqCst), 1);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::error::SignalError;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;
type SlotTable<Args> = Mutex<SlotMap<ConnectionId, Slot<Args>>>;

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple for multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`. Slots always run on the emitting thread;
/// callers that need a specific thread route their work through a
/// [`DispatchQueue`](crate::DispatchQueue) first.
pub struct Signal<Args> {
    connections: Arc<SlotTable<Args>>,
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(SlotMap::with_key())),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Connect a slot that is disconnected when the returned guard is dropped.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            connections: Arc::downgrade(&self.connections),
            id,
            armed: true,
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// Returns the previous blocked state so nested blocks can restore it.
    pub fn set_blocked(&self, blocked: bool) -> bool {
        self.blocked.swap(blocked, Ordering::SeqCst)
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots on the current thread.
    ///
    /// Does nothing while the signal is blocked.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        // Release the lock before running slots so they may reconnect.
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }
}

/// A connection guard that automatically disconnects when dropped.
///
/// The guard only holds a weak reference to the signal's connection table,
/// so it is safe to outlive the signal itself.
///
/// # Example
///
/// ```
/// use horizon_structure_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);
/// }
/// signal.emit(43);
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard<Args> {
    connections: Weak<SlotTable<Args>>,
    id: ConnectionId,
    armed: bool,
}

impl<Args> ConnectionGuard<Args> {
    /// The id of the guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Disconnect now instead of on drop, reporting why it failed if it did.
    pub fn disconnect(mut self) -> Result<(), SignalError> {
        self.armed = false;
        let connections = self.connections.upgrade().ok_or(SignalError::SignalDropped)?;
        connections
            .lock()
            .remove(self.id)
            .map(|_| ())
            .ok_or(SignalError::InvalidConnection)
    }

    /// Keep the connection alive past the guard.
    pub fn forget(mut self) -> ConnectionId {
        self.armed = false;
        self.id
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(connections) = self.connections.upgrade() {
            connections.lock().remove(self.id);
        }
    }
}

static_assertions::assert_impl_all!(Signal<(u64, usize)>: Send, Sync);
