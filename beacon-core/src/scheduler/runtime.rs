//! Tokio-backed scheduler.

use tokio::runtime::Handle;
use tracing::debug;

use super::{Scheduler, Task, ThreadScheduler};

/// Spawns tasks onto a tokio runtime.
///
/// Uses the handle given at construction, or else whatever runtime is
/// current on the spawning thread. Outside any runtime the task gets its own
/// OS thread instead, so `fire_async` still never blocks the caller.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    handle: Option<Handle>,
}

impl TokioScheduler {
    /// Scheduler that follows the ambient runtime.
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Scheduler pinned to a specific runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self { handle: Some(handle) }
    }

    /// Capture the runtime current on this thread, if there is one.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::with_handle)
    }
}

impl Scheduler for TokioScheduler {
    fn spawn(&self, task: Task) {
        let handle = match &self.handle {
            Some(handle) => Some(handle.clone()),
            None => Handle::try_current().ok(),
        };

        match handle {
            Some(handle) => {
                // Detached; listener panics are already isolated by dispatch.
                handle.spawn(async move { task() });
            }
            None => {
                debug!("No tokio runtime on this thread, spawning a thread instead");
                ThreadScheduler::default().spawn(task);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn spawns_onto_ambient_runtime() {
        let (tx, rx) = oneshot::channel();

        TokioScheduler::new().spawn(Box::new(move || {
            let _ = tx.send(7);
        }));

        assert_eq!(rx.await.unwrap(), 7);
    }

    #[test]
    fn falls_back_to_thread_without_runtime() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        let (tx, rx) = std::sync::mpsc::channel();

        TokioScheduler::new().spawn(Box::new(move || {
            ran_clone.store(true, Ordering::SeqCst);
            let _ = tx.send(());
        }));

        rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn pinned_handle_is_used_from_outside_the_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let scheduler = TokioScheduler::with_handle(runtime.handle().clone());
        let (tx, rx) = std::sync::mpsc::channel();

        scheduler.spawn(Box::new(move || {
            let _ = tx.send(Handle::try_current().is_ok());
        }));

        let inside_runtime = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert!(inside_runtime);
    }
}
