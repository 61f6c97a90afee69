//! Error types for signal operations.
//!
//! Payload-shape mismatches never appear here: the payload type is a generic
//! parameter, so a handler or fire with the wrong arguments does not compile.

use thiserror::Error;

/// Errors surfaced synchronously by subscribe operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// The signal was destroyed (or dropped) before the call.
    #[error("signal `{label}` has been destroyed")]
    Destroyed {
        /// Label of the destroyed signal.
        label: String,
    },
}

/// Result alias for signal operations.
pub type Result<T> = std::result::Result<T, SignalError>;
