//! Signals
//!
//! This module implements the broadcast primitive and its handles.
//!
//! # Concepts
//!
//! ## Signal
//!
//! A [`Signal`] owns a broadcast channel. It is the only handle that can
//! fire values into the channel or destroy it.
//!
//! ## Connector
//!
//! A [`Connector`] is the subscribe-only view of a signal: it can connect
//! listeners and wait for the next fire, but cannot fire or destroy. Give it
//! to code that should only listen.
//!
//! ## Connection
//!
//! Every subscribe call returns a [`Connection`], the handle that cancels
//! that one subscription. Disconnection is permanent.
//!
//! # Implementation Notes
//!
//! All three handles share one channel resource. The signal holds the only
//! strong reference; connectors and connections hold weak ones, so the
//! signal's lifetime is exactly its owner's.

mod builder;
mod channel;
mod connection;
mod connector;
mod context;
mod once;
#[allow(clippy::module_inception)]
mod signal;
mod wait;

pub use builder::SignalBuilder;
pub use channel::SignalId;
pub use connection::{Connection, ListenerId};
pub use connector::Connector;
pub use context::DispatchContext;
pub use signal::Signal;
pub use wait::Wait;
