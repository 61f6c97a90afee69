//! Waiting for the next fire.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::trace;

use super::channel::{Channel, Delivery};
use super::{once, Connection};

/// Future returned by `wait`, resolving with the arguments of the next fire.
///
/// The internal listener is registered when `wait` is called, so a fire that
/// happens before the first poll is still observed. If the signal is
/// destroyed first, the future never resolves; wrap it in a timeout when a
/// deadline matters. Dropping an unresolved `Wait` disconnects its listener.
#[must_use = "futures do nothing unless awaited"]
pub struct Wait<T> {
    rx: oneshot::Receiver<T>,
    connection: Option<Connection>,
    closed: bool,
}

impl<T> Wait<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn new(channel: Option<Arc<Channel<T>>>) -> Self {
        let (tx, rx) = oneshot::channel();

        // Without a live channel the sender is dropped right away and the
        // future stays pending.
        let connection = channel.and_then(|channel| {
            channel
                .register_with(Delivery::Inline, move |connection| {
                    once::handler(
                        move |args: T| {
                            let _ = tx.send(args);
                        },
                        connection.clone(),
                    )
                })
                .ok()
        });

        Self { rx, connection, closed: false }
    }
}

impl<T> Future for Wait<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if self.closed {
            return Poll::Pending;
        }

        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(args)) => {
                self.connection = None;
                Poll::Ready(args)
            }
            Poll::Ready(Err(_)) => {
                // Signal destroyed before firing; nothing will ever wake us.
                trace!("Wait abandoned by destroyed signal");
                self.closed = true;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for Wait<T> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.disconnect();
        }
    }
}

impl<T> std::fmt::Debug for Wait<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wait")
            .field("connection", &self.connection)
            .field("closed", &self.closed)
            .finish()
    }
}
