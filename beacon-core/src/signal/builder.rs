//! Signal construction.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::Signal;
use crate::config::{SchedulerKind, SignalConfig};
use crate::scheduler::{self, Scheduler};

/// Builder for [`Signal`].
///
/// ```rust,ignore
/// let signal = Signal::<u64>::builder()
///     .label("ticks")
///     .scheduler(ThreadScheduler::named("tick-listener"))
///     .build();
/// ```
pub struct SignalBuilder<T> {
    config: SignalConfig,
    scheduler: Option<Arc<dyn Scheduler>>,
    _payload: PhantomData<fn(T)>,
}

impl<T> SignalBuilder<T>
where
    T: Clone + Send + 'static,
{
    /// Builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: SignalConfig::default(),
            scheduler: None,
            _payload: PhantomData,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SignalConfig) -> Self {
        self.config = config;
        self
    }

    /// Label used in logs and errors.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Warn once the listener count passes `limit`; `None` disables it.
    pub fn warn_listener_count(mut self, limit: Option<usize>) -> Self {
        self.config.warn_listener_count = limit;
        self
    }

    /// Maximum nesting of this signal's fires on one thread (at least 1).
    pub fn max_dispatch_depth(mut self, depth: usize) -> Self {
        self.config.max_dispatch_depth = depth;
        self
    }

    /// Pick one of the built-in schedulers.
    pub fn scheduler_kind(mut self, kind: SchedulerKind) -> Self {
        self.config.scheduler = kind;
        self.scheduler = None;
        self
    }

    /// Use a custom scheduler. Takes precedence over the configured kind.
    pub fn scheduler(self, scheduler: impl Scheduler) -> Self {
        self.shared_scheduler(Arc::new(scheduler))
    }

    /// Use a scheduler shared with other signals.
    pub fn shared_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Create the signal, falling back to the configured scheduler kind
    /// when no custom scheduler was given.
    pub fn build(self) -> Signal<T> {
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| scheduler::for_kind(self.config.scheduler));
        Signal::from_parts(&self.config, scheduler)
    }
}

impl<T> Default for SignalBuilder<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SignalBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBuilder")
            .field("config", &self.config)
            .field("custom_scheduler", &self.scheduler.is_some())
            .finish()
    }
}
