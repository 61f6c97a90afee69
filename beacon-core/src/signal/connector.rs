//! Connector Implementation
//!
//! A Connector is the subscribe-only face of a signal. Hand it to code that
//! should listen but never fire or destroy.
//!
//! It holds a weak reference to the signal's channel: it never keeps the
//! signal alive, and once the signal is destroyed or dropped every subscribe
//! call fails with [`SignalError::Destroyed`].

use std::fmt;
use std::sync::{Arc, Weak};

use super::channel::{Channel, Delivery};
use super::{Connection, Wait};
use crate::error::{Result, SignalError};

/// Subscribe-only view of a [`Signal`](super::Signal).
///
/// # Example
///
/// ```rust,ignore
/// let signal = Signal::<String>::new();
/// let connector = signal.connector();
///
/// // Consumers get the connector; only the owner can fire.
/// connector.connect(|name| println!("hello, {name}"))?;
/// signal.fire("Ada".to_string());
/// ```
pub struct Connector<T> {
    channel: Weak<Channel<T>>,
    label: Arc<str>,
}

impl<T> Connector<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn new(channel: &Arc<Channel<T>>) -> Self {
        Self {
            channel: Arc::downgrade(channel),
            label: channel.label().into(),
        }
    }

    fn channel(&self) -> Result<Arc<Channel<T>>> {
        self.channel
            .upgrade()
            .ok_or_else(|| SignalError::Destroyed { label: self.label.to_string() })
    }

    /// Connect a listener that runs on the firing thread, in registration
    /// order, every time the signal fires.
    ///
    /// # Errors
    ///
    /// [`SignalError::Destroyed`] if the signal has been destroyed.
    pub fn connect<F>(&self, handler: F) -> Result<Connection>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.channel()?.register(Arc::new(handler), Delivery::Inline)
    }

    /// Connect a listener that runs on its own scheduler task for each fire.
    ///
    /// The handler may run concurrently with the firer and with other
    /// parallel listeners, so it must not assume shared mutable state with
    /// either. No ordering is promised relative to inline listeners.
    ///
    /// # Errors
    ///
    /// [`SignalError::Destroyed`] if the signal has been destroyed.
    pub fn connect_parallel<F>(&self, handler: F) -> Result<Connection>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.channel()?.register(Arc::new(handler), Delivery::Parallel)
    }

    /// Resolve with the arguments of the next fire.
    ///
    /// See [`Wait`] for the behavior when the signal is destroyed first.
    pub fn wait(&self) -> Wait<T> {
        Wait::new(self.channel.upgrade())
    }

    /// Whether the signal can still accept listeners.
    pub fn is_alive(&self) -> bool {
        self.channel.upgrade().is_some_and(|channel| !channel.is_destroyed())
    }

    /// Number of listeners currently connected to the signal.
    pub fn listener_count(&self) -> usize {
        self.channel.upgrade().map_or(0, |channel| channel.listener_count())
    }
}

impl<T> Clone for Connector<T> {
    fn clone(&self) -> Self {
        Self {
            channel: Weak::clone(&self.channel),
            label: Arc::clone(&self.label),
        }
    }
}

impl<T> fmt::Debug for Connector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("label", &self.label)
            .field("alive", &self.channel.upgrade().is_some_and(|c| !c.is_destroyed()))
            .finish()
    }
}
