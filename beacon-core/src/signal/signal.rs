//! Signal Implementation
//!
//! A Signal is the owning end of a broadcast: the only handle that can fire
//! or destroy. Subscribing is delegated to the [`Connector`] it composes.
//!
//! # How Signals Work
//!
//! 1. `connect` adds a listener to the channel's ordered listener set and
//!    returns a [`Connection`].
//!
//! 2. `fire` snapshots the listener set and invokes each listener once, in
//!    registration order, on the calling thread. Parallel listeners are
//!    handed to the scheduler instead.
//!
//! 3. `fire_async` hands the whole broadcast to the scheduler and returns
//!    immediately.
//!
//! 4. `destroy` (or dropping the signal) disconnects every listener and
//!    refuses new ones.
//!
//! # Payload
//!
//! The payload type `T` is fixed for the signal's lifetime. Multiple
//! arguments are a tuple, no arguments is `()`:
//!
//! ```rust,ignore
//! let moved = Signal::<(String, f32, f32)>::new();
//! moved.connect(|(name, x, y)| println!("{name} moved to {x},{y}"))?;
//! moved.fire(("ada".into(), 1.0, 2.0));
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::channel::{Channel, Delivery, SignalId};
use super::{once, Connection, Connector, SignalBuilder, Wait};
use crate::config::SignalConfig;
use crate::error::Result;
use crate::scheduler::Scheduler;

/// A typed broadcast signal.
///
/// # Type Parameters
///
/// - `T`: The payload handed to every listener. Each listener receives its
///   own clone; the last one receives the original.
pub struct Signal<T> {
    channel: Arc<Channel<T>>,
    connector: Connector<T>,
}

impl<T> Signal<T>
where
    T: Clone + Send + 'static,
{
    /// Create a signal with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    /// Create a signal from a configuration.
    pub fn with_config(config: SignalConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Start building a signal.
    pub fn builder() -> SignalBuilder<T> {
        SignalBuilder::new()
    }

    pub(crate) fn from_parts(config: &SignalConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        let channel = Arc::new(Channel::new(config, scheduler));
        let connector = Connector::new(&channel);
        Self { channel, connector }
    }

    /// The signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.channel.id()
    }

    /// The label used in logs and errors.
    pub fn label(&self) -> &str {
        self.channel.label()
    }

    /// The subscribe-only view of this signal.
    pub fn connector(&self) -> Connector<T> {
        self.connector.clone()
    }

    /// Invoke every connected listener with `args`.
    ///
    /// Listeners run in registration order before this returns (parallel
    /// listeners are only scheduled). Listeners connected while the fire is
    /// running wait for the next one. A panicking listener is logged and
    /// skipped. Firing a destroyed signal does nothing.
    pub fn fire(&self, args: T) {
        self.channel.dispatch(args);
    }

    /// Run the broadcast on a scheduler task and return immediately.
    ///
    /// Within that broadcast listeners still run in registration order; two
    /// `fire_async` calls are not ordered relative to each other.
    pub fn fire_async(&self, args: T) {
        if self.channel.is_destroyed() {
            trace!(signal = %self.label(), "Async fire on destroyed signal ignored");
            return;
        }

        let channel = Arc::clone(&self.channel);
        self.channel
            .scheduler()
            .spawn(Box::new(move || channel.dispatch(args)));
    }

    /// Connect a listener. See [`Connector::connect`].
    ///
    /// # Errors
    ///
    /// [`SignalError::Destroyed`](crate::SignalError::Destroyed) if the signal has been destroyed.
    pub fn connect<F>(&self, handler: F) -> Result<Connection>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.connector.connect(handler)
    }

    /// Connect a parallel listener. See [`Connector::connect_parallel`].
    ///
    /// # Errors
    ///
    /// [`SignalError::Destroyed`](crate::SignalError::Destroyed) if the signal has been destroyed.
    pub fn connect_parallel<F>(&self, handler: F) -> Result<Connection>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.connector.connect_parallel(handler)
    }

    /// Connect a listener that runs for the next fire only.
    ///
    /// The connection reports disconnected as soon as the listener is
    /// reached. A fire from inside the handler does not run it again.
    ///
    /// # Errors
    ///
    /// [`SignalError::Destroyed`](crate::SignalError::Destroyed) if the signal has been destroyed.
    pub fn once<F>(&self, handler: F) -> Result<Connection>
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.channel.register_with(Delivery::Inline, move |connection| {
            once::handler(handler, connection.clone())
        })
    }

    /// Resolve with the arguments of the next fire. See [`Wait`].
    pub fn wait(&self) -> Wait<T> {
        self.connector.wait()
    }

    /// Disconnect every listener and refuse new ones.
    ///
    /// Safe to call more than once; later calls do nothing. A fire running
    /// on another thread skips every listener it has not started yet.
    pub fn destroy(&self) {
        self.channel.destroy();
    }

    /// Whether [`Signal::destroy`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.channel.is_destroyed()
    }

    /// Number of listeners currently connected.
    pub fn listener_count(&self) -> usize {
        self.channel.listener_count()
    }
}

impl<T> Default for Signal<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Signal<T> {
    fn drop(&mut self) {
        self.channel.destroy();
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.channel.id())
            .field("label", &self.channel.label())
            .field("listeners", &self.channel.listener_count())
            .field("destroyed", &self.channel.is_destroyed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
