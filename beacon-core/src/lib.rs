//! Beacon Core
//!
//! Strongly-typed, in-process broadcast signals. A [`Signal`] lets a
//! producer fire a value to any number of listeners, synchronously or on a
//! scheduler task, and lets any caller await the next fire.
//!
//! # Architecture
//!
//! The crate is organized into a few modules:
//!
//! - `signal`: the Signal, its subscribe-only Connector, and Connections
//! - `scheduler`: the task-spawning seam used for deferred work
//! - `config`: per-signal configuration
//! - `error`: error types
//!
//! # Example
//!
//! ```rust,ignore
//! use beacon_core::Signal;
//!
//! let joined = Signal::<String>::new();
//!
//! // Consumers only ever see the connector.
//! let connector = joined.connector();
//! let greeting = connector.connect(|name| println!("welcome, {name}"))?;
//!
//! joined.fire("ada".to_string());   // prints "welcome, ada"
//!
//! greeting.disconnect();
//! joined.destroy();
//! ```

pub mod config;
pub mod error;
pub mod scheduler;
pub mod signal;

pub use config::{SchedulerKind, SignalConfig};
pub use error::{Result, SignalError};
pub use scheduler::{InlineScheduler, Scheduler, Task, ThreadScheduler, TokioScheduler};
pub use signal::{
    Connection, Connector, DispatchContext, ListenerId, Signal, SignalBuilder, SignalId, Wait,
};
