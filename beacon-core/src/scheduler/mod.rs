//! Task Scheduling
//!
//! Signals never spawn work directly. Deferred broadcasts (`fire_async`) and
//! parallel listeners are handed to a [`Scheduler`], the host-supplied
//! primitive for "run this callback on a fresh logical task".
//!
//! Three schedulers ship with the crate:
//!
//! - [`TokioScheduler`]: spawns onto a tokio runtime (the default)
//! - [`ThreadScheduler`]: one OS thread per task
//! - [`InlineScheduler`]: runs the task immediately, mostly for tests
//!
//! Hosts with their own executor implement [`Scheduler`] and pass it to
//! `SignalBuilder::scheduler`.

mod runtime;
mod thread;

use std::sync::Arc;

use crate::config::SchedulerKind;

pub use runtime::TokioScheduler;
pub use thread::ThreadScheduler;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs callbacks on a new logical task without blocking the caller.
pub trait Scheduler: Send + Sync + 'static {
    /// Schedule `task` to run. Must not block on the task's completion.
    fn spawn(&self, task: Task);
}

/// Runs every task synchronously on the calling thread.
///
/// With this scheduler `fire_async` behaves like `fire` and parallel
/// listeners run in registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn spawn(&self, task: Task) {
        task();
    }
}

/// Build the built-in scheduler for a config value.
pub fn for_kind(kind: SchedulerKind) -> Arc<dyn Scheduler> {
    match kind {
        SchedulerKind::Tokio => Arc::new(TokioScheduler::new()),
        SchedulerKind::Thread => Arc::new(ThreadScheduler::default()),
        SchedulerKind::Inline => Arc::new(InlineScheduler),
    }
}
