//! Thread-per-task scheduler.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::error;

use super::{Scheduler, Task};

/// Spawns a named OS thread for every task.
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    name: String,
}

impl ThreadScheduler {
    /// Scheduler whose threads carry the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::named("beacon-task")
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn(&self, task: Task) {
        // Keep a second handle on the task so it can still run if the
        // thread cannot be created.
        let slot = Arc::new(Mutex::new(Some(task)));
        let thread_slot = Arc::clone(&slot);

        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let task = thread_slot.lock().take();
                if let Some(task) = task {
                    task();
                }
            });

        if let Err(err) = spawned {
            error!(error = %err, "Failed to spawn task thread, running inline");
            let task = slot.lock().take();
            if let Some(task) = task {
                task();
            }
        }
    }
}
