//! Connections
//!
//! A Connection is the handle to one subscription. It can cancel that
//! subscription and report whether it is still live; it never owns the
//! signal it came from.
//!
//! A connection moves from connected to disconnected exactly once. That
//! happens on an explicit `disconnect`, when the signal is destroyed, or
//! when a `once` listener fires. Dropping the handle does not disconnect.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tracing::trace;

/// Unique identifier for a listener.
///
/// Identifiers are allocated from a process-wide counter, so they are unique
/// across signals and increase in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared state of one subscription.
///
/// The channel's listener entry and every [`Connection`] handle point at the
/// same slot, so a disconnect is visible to a dispatch already in progress.
#[derive(Debug)]
pub(crate) struct Slot {
    id: ListenerId,
    connected: AtomicBool,
}

impl Slot {
    pub(crate) fn new() -> Self {
        Self {
            id: ListenerId::next(),
            connected: AtomicBool::new(true),
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Mark the slot disconnected. Returns `true` only for the call that
    /// performed the transition.
    pub(crate) fn disconnect(&self) -> bool {
        self.connected.swap(false, Ordering::SeqCst)
    }
}

/// Something that can drop a listener from its listener set.
///
/// Implemented by the channel behind every signal. Connections hold it as a
/// weak trait object so they stay independent of the payload type.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: ListenerId);
}

/// Handle to a single subscription.
///
/// # Example
///
/// ```rust,ignore
/// let signal = Signal::<u32>::new();
/// let connection = signal.connect(|n| println!("got {n}"))?;
///
/// signal.fire(1);             // prints "got 1"
/// connection.disconnect();
/// signal.fire(2);             // nothing
/// assert!(!connection.is_connected());
/// ```
#[derive(Clone)]
pub struct Connection {
    slot: Arc<Slot>,
    registry: Weak<dyn Detach>,
}

impl Connection {
    pub(crate) fn new(slot: Arc<Slot>, registry: Weak<dyn Detach>) -> Self {
        Self { slot, registry }
    }

    /// Identifier of the listener behind this connection.
    pub fn id(&self) -> ListenerId {
        self.slot.id()
    }

    /// Whether the listener is still registered.
    pub fn is_connected(&self) -> bool {
        self.slot.is_connected()
    }

    /// Remove the listener from its signal.
    ///
    /// Idempotent. An invocation that already started keeps running; the
    /// listener is skipped by any dispatch that has not reached it yet.
    pub fn disconnect(&self) {
        if !self.slot.disconnect() {
            return;
        }

        trace!(listener = %self.slot.id(), "Disconnecting listener");

        // A dead registry means the signal is gone and the listener with it.
        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.slot.id());
        }
    }

    /// Alias for [`Connection::disconnect`].
    pub fn destroy(&self) {
        self.disconnect();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MockRegistry {
        detached: Mutex<Vec<ListenerId>>,
    }

    impl Detach for MockRegistry {
        fn detach(&self, id: ListenerId) {
            self.detached.lock().push(id);
        }
    }

    fn connection_to(registry: &Arc<MockRegistry>) -> Connection {
        let registry: Arc<dyn Detach> = registry.clone();
        Connection::new(Arc::new(Slot::new()), Arc::downgrade(&registry))
    }

    #[test]
    fn listener_ids_are_unique_and_ordered() {
        let id1 = ListenerId::next();
        let id2 = ListenerId::next();
        let id3 = ListenerId::next();

        assert!(id1 < id2);
        assert!(id2 < id3);
    }

    #[test]
    fn disconnect_detaches_once() {
        let registry = Arc::new(MockRegistry::default());
        let connection = connection_to(&registry);
        assert!(connection.is_connected());

        connection.disconnect();
        connection.disconnect();
        connection.destroy();

        assert!(!connection.is_connected());
        assert_eq!(*registry.detached.lock(), vec![connection.id()]);
    }

    #[test]
    fn clones_share_state() {
        let registry = Arc::new(MockRegistry::default());
        let connection = connection_to(&registry);
        let clone = connection.clone();

        clone.disconnect();

        assert!(!connection.is_connected());
        assert_eq!(connection.id(), clone.id());
    }

    #[test]
    fn disconnect_after_registry_dropped_is_harmless() {
        let registry = Arc::new(MockRegistry::default());
        let connection = connection_to(&registry);
        drop(registry);

        connection.disconnect();
        assert!(!connection.is_connected());
    }
}
