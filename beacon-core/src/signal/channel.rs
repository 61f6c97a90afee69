//! The Channel Resource
//!
//! The channel is the single shared structure behind a signal: the ordered
//! listener set, the destroyed flag, and the scheduler used for deferred
//! work. `Signal` owns it (strong `Arc`); `Connector` and `Connection` hold
//! weak references only.
//!
//! # Dispatch
//!
//! A fire takes a snapshot of the listener set under the lock, releases the
//! lock, then walks the snapshot in registration order. Consequences:
//!
//! 1. Listeners connected during a dispatch are not in its snapshot and
//!    first hear the next fire.
//!
//! 2. Each listener's connected flag is re-checked right before it runs, so
//!    a listener disconnected mid-dispatch is skipped if not yet reached.
//!
//! 3. Listeners may connect, disconnect, fire or destroy re-entrantly; the
//!    lock is never held while user code runs.
//!
//! # Destroy
//!
//! `destroy` flips the destroyed flag, drains the listener set and clears
//! every connected flag. A dispatch in flight on another thread therefore
//! skips every listener it has not started yet.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};

use super::connection::{Connection, Detach, ListenerId, Slot};
use super::context::DispatchContext;
use crate::config::SignalConfig;
use crate::error::{Result, SignalError};
use crate::scheduler::Scheduler;

/// Boxed listener callback.
pub(crate) type Handler<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Unique identifier for a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId(u64);

impl SignalId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a listener runs relative to the fire that reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// On the firing thread, in registration order.
    Inline,
    /// On its own scheduler task.
    Parallel,
}

pub(crate) struct Listener<T> {
    slot: Arc<Slot>,
    handler: Handler<T>,
    delivery: Delivery,
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            handler: Arc::clone(&self.handler),
            delivery: self.delivery,
        }
    }
}

/// Snapshot buffer; most signals have only a handful of listeners.
type Snapshot<T> = SmallVec<[Listener<T>; 8]>;

pub(crate) struct Channel<T> {
    id: SignalId,
    label: Arc<str>,
    listeners: Mutex<IndexMap<ListenerId, Listener<T>>>,
    destroyed: AtomicBool,
    scheduler: Arc<dyn Scheduler>,
    warn_listener_count: Option<usize>,
    max_dispatch_depth: usize,
}

impl<T> Channel<T> {
    pub(crate) fn new(config: &SignalConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        let id = SignalId::next();
        let label: Arc<str> = match &config.label {
            Some(label) => label.as_str().into(),
            None => format!("signal-{id}").into(),
        };

        debug!(signal = %label, scheduler = ?config.scheduler, "Creating signal");

        Self {
            id,
            label,
            listeners: Mutex::new(IndexMap::new()),
            destroyed: AtomicBool::new(false),
            scheduler,
            warn_listener_count: config.warn_listener_count,
            // A top-level fire is depth 0, so at least one level is always allowed.
            max_dispatch_depth: config.max_dispatch_depth.max(1),
        }
    }

    pub(crate) fn id(&self) -> SignalId {
        self.id
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub(crate) fn destroyed_error(&self) -> SignalError {
        SignalError::Destroyed { label: self.label.to_string() }
    }

    /// Disconnect every listener and refuse further registrations.
    ///
    /// Returns `false` if the channel was already destroyed.
    pub(crate) fn destroy(&self) -> bool {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return false;
        }

        let drained: Vec<Listener<T>> = self.listeners.lock().drain(..).map(|(_, l)| l).collect();
        for listener in &drained {
            listener.slot.disconnect();
        }

        debug!(signal = %self.label, listeners = drained.len(), "Signal destroyed");

        // Handlers are dropped here, outside the lock.
        drop(drained);
        true
    }
}

impl<T> Channel<T>
where
    T: Clone + Send + 'static,
{
    /// Register a listener.
    pub(crate) fn register(self: &Arc<Self>, handler: Handler<T>, delivery: Delivery) -> Result<Connection> {
        self.register_with(delivery, |_| handler)
    }

    /// Register a listener whose handler needs its own connection, as
    /// one-shot listeners do.
    pub(crate) fn register_with<B>(self: &Arc<Self>, delivery: Delivery, build: B) -> Result<Connection>
    where
        B: FnOnce(&Connection) -> Handler<T>,
    {
        let slot = Arc::new(Slot::new());
        let registry: Weak<dyn Detach> = Arc::downgrade(self) as Weak<dyn Detach>;
        let connection = Connection::new(Arc::clone(&slot), registry);
        let handler = build(&connection);

        let count = {
            let mut listeners = self.listeners.lock();
            // Checked under the lock so a concurrent destroy either drains
            // this listener or makes us fail here.
            if self.is_destroyed() {
                drop(listeners);
                slot.disconnect();
                return Err(self.destroyed_error());
            }
            listeners.insert(slot.id(), Listener { slot: Arc::clone(&slot), handler, delivery });
            listeners.len()
        };

        trace!(signal = %self.label, listener = %slot.id(), ?delivery, listeners = count, "Listener connected");

        if let Some(limit) = self.warn_listener_count {
            // Warn once, on the connect that crosses the threshold.
            if count > limit && count - 1 == limit {
                warn!(
                    signal = %self.label,
                    listeners = count,
                    limit,
                    "Listener count exceeded warning threshold, possible leak"
                );
            }
        }

        Ok(connection)
    }

    /// Deliver `args` to every listener connected right now.
    pub(crate) fn dispatch(&self, args: T) {
        if self.is_destroyed() {
            trace!(signal = %self.label, "Fire on destroyed signal ignored");
            return;
        }

        let depth = DispatchContext::depth_of(self.id);
        if depth >= self.max_dispatch_depth {
            warn!(
                signal = %self.label,
                depth,
                max = self.max_dispatch_depth,
                "Dispatch depth exceeded, dropping fire"
            );
            return;
        }
        let _ctx = DispatchContext::enter(self.id);

        let snapshot: Snapshot<T> = self.listeners.lock().values().cloned().collect();
        trace!(signal = %self.label, listeners = snapshot.len(), depth, "Dispatching");

        // Clone for every listener but the last, which takes the original.
        if let Some((last, rest)) = snapshot.split_last() {
            for listener in rest {
                self.deliver(listener, args.clone());
            }
            self.deliver(last, args);
        }
    }

    fn deliver(&self, listener: &Listener<T>, args: T) {
        if !listener.slot.is_connected() {
            return;
        }

        match listener.delivery {
            Delivery::Inline => invoke(&self.label, &listener.slot, &listener.handler, args),
            Delivery::Parallel => {
                let label = Arc::clone(&self.label);
                let slot = Arc::clone(&listener.slot);
                let handler = Arc::clone(&listener.handler);
                self.scheduler.spawn(Box::new(move || {
                    if slot.is_connected() {
                        invoke(&label, &slot, &handler, args);
                    }
                }));
            }
        }
    }
}

impl<T> Detach for Channel<T> {
    fn detach(&self, id: ListenerId) {
        let removed = self.listeners.lock().shift_remove(&id);
        if removed.is_some() {
            trace!(signal = %self.label, listener = %id, "Listener removed");
        }
    }
}

/// Run one listener, isolating panics from the rest of the dispatch.
fn invoke<T>(label: &str, slot: &Slot, handler: &Handler<T>, args: T) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
        error!(
            signal = %label,
            listener = %slot.id(),
            panic = %panic_message(payload.as_ref()),
            "Listener panicked"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::InlineScheduler;

    fn channel<T>(config: SignalConfig) -> Arc<Channel<T>> {
        Arc::new(Channel::new(&config, Arc::new(InlineScheduler)))
    }

    fn recorder(log: &Arc<Mutex<Vec<(char, i32)>>>, tag: char) -> Handler<i32> {
        let log = Arc::clone(log);
        Arc::new(move |n| log.lock().push((tag, n)))
    }

    #[test]
    fn default_label_uses_id() {
        let channel = channel::<()>(SignalConfig::default());
        assert_eq!(channel.label(), format!("signal-{}", channel.id()));
    }

    #[test]
    fn dispatch_follows_registration_order() {
        let channel = channel(SignalConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        channel.register(recorder(&log, 'a'), Delivery::Inline).unwrap();
        channel.register(recorder(&log, 'b'), Delivery::Inline).unwrap();
        channel.register(recorder(&log, 'c'), Delivery::Inline).unwrap();

        channel.dispatch(1);
        assert_eq!(*log.lock(), vec![('a', 1), ('b', 1), ('c', 1)]);
    }

    #[test]
    fn detach_keeps_remaining_order() {
        let channel = channel(SignalConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        channel.register(recorder(&log, 'a'), Delivery::Inline).unwrap();
        let b = channel.register(recorder(&log, 'b'), Delivery::Inline).unwrap();
        channel.register(recorder(&log, 'c'), Delivery::Inline).unwrap();

        b.disconnect();
        assert_eq!(channel.listener_count(), 2);

        channel.dispatch(2);
        assert_eq!(*log.lock(), vec![('a', 2), ('c', 2)]);
    }

    #[test]
    fn panicking_listener_does_not_stop_delivery() {
        let channel = channel(SignalConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        channel.register(Arc::new(|_: i32| panic!("listener fault")), Delivery::Inline).unwrap();
        channel.register(recorder(&log, 'b'), Delivery::Inline).unwrap();

        channel.dispatch(3);
        assert_eq!(*log.lock(), vec![('b', 3)]);
    }

    #[test]
    fn destroy_is_idempotent_and_refuses_registration() {
        let channel = channel(SignalConfig::default().label("doomed"));
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = channel.register(recorder(&log, 'a'), Delivery::Inline).unwrap();

        assert!(channel.destroy());
        assert!(!channel.destroy());
        assert!(!a.is_connected());
        assert_eq!(channel.listener_count(), 0);

        let err = channel.register(recorder(&log, 'b'), Delivery::Inline).unwrap_err();
        assert_eq!(err, SignalError::Destroyed { label: "doomed".into() });

        channel.dispatch(4);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn depth_limit_stops_runaway_recursion() {
        let config = SignalConfig { max_dispatch_depth: 3, ..SignalConfig::default() };
        let channel: Arc<Channel<u32>> = channel(config);
        let calls = Arc::new(Mutex::new(0u32));

        let weak = Arc::downgrade(&channel);
        let calls_clone = Arc::clone(&calls);
        channel
            .register(
                Arc::new(move |n: u32| {
                    *calls_clone.lock() += 1;
                    if let Some(channel) = weak.upgrade() {
                        channel.dispatch(n + 1);
                    }
                }),
                Delivery::Inline,
            )
            .unwrap();

        channel.dispatch(0);
        assert_eq!(*calls.lock(), 3);
    }

    #[test]
    fn zero_dispatch_depth_still_delivers_top_level_fires() {
        let config: SignalConfig = serde_json::from_str(r#"{ "max_dispatch_depth": 0 }"#).unwrap();
        let channel = channel(config);
        let log = Arc::new(Mutex::new(Vec::new()));

        channel.register(recorder(&log, 'a'), Delivery::Inline).unwrap();
        channel.dispatch(1);

        assert_eq!(*log.lock(), vec![('a', 1)]);
    }

    #[test]
    fn max_listener_warning_threshold_does_not_overflow() {
        let config: SignalConfig =
            serde_json::from_str(r#"{ "warn_listener_count": 18446744073709551615 }"#).unwrap();
        assert_eq!(config.warn_listener_count, Some(usize::MAX));

        let channel = channel(config);
        let log = Arc::new(Mutex::new(Vec::new()));

        channel.register(recorder(&log, 'a'), Delivery::Inline).unwrap();
        channel.register(recorder(&log, 'b'), Delivery::Inline).unwrap();
        channel.dispatch(2);

        assert_eq!(*log.lock(), vec![('a', 2), ('b', 2)]);
    }

    #[test]
    fn panic_message_extracts_strings() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(boxed.as_ref()), "<non-string panic payload>");
    }
}
