//! One-shot listeners.
//!
//! [`Once`] owns the user handler and the connection it was registered
//! under. The first call takes the handler out, disconnects, then runs it;
//! any later or re-entrant call finds the handler gone and does nothing.

use std::sync::Arc;

use parking_lot::Mutex;

use super::channel::Handler;
use super::Connection;

pub(crate) struct Once<F> {
    handler: Mutex<Option<F>>,
    connection: Connection,
}

impl<F> Once<F> {
    pub(crate) fn new(handler: F, connection: Connection) -> Self {
        Self {
            handler: Mutex::new(Some(handler)),
            connection,
        }
    }

    pub(crate) fn call<T>(&self, args: T)
    where
        F: FnOnce(T),
    {
        let handler = self.handler.lock().take();
        let Some(handler) = handler else {
            return;
        };

        // Disconnect first so a fire from inside the handler cannot reach us.
        self.connection.disconnect();
        handler(args);
    }
}

/// Wrap `handler` as a listener that runs at most once.
pub(crate) fn handler<T, F>(handler: F, connection: Connection) -> Handler<T>
where
    F: FnOnce(T) + Send + 'static,
    T: 'static,
{
    let once = Once::new(handler, connection);
    Arc::new(move |args: T| once.call(args))
}
