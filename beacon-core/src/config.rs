//! Signal Configuration
//!
//! Per-signal settings. Everything here has a sensible default, so most
//! callers never touch it; `Signal::new()` uses `SignalConfig::default()`.
//!
//! The config is plain data and can be loaded from any serde format:
//!
//! ```rust,ignore
//! let config: SignalConfig = serde_json::from_str(r#"{ "label": "chat", "scheduler": "thread" }"#)?;
//! let signal = Signal::<String>::with_config(config);
//! ```

use serde::{Deserialize, Serialize};

/// Default threshold above which a growing listener set is reported.
pub const DEFAULT_WARN_LISTENER_COUNT: usize = 256;

/// Default limit on nested fires of one signal on a single thread.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 64;

/// Which built-in scheduler runs `fire_async` broadcasts and parallel listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    /// Spawn onto the ambient tokio runtime.
    #[default]
    Tokio,
    /// Spawn a dedicated OS thread per task.
    Thread,
    /// Run the task immediately on the calling thread.
    Inline,
}

/// Configuration for a single signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Name used in log fields and error messages.
    ///
    /// When absent, the signal is labelled `signal-<id>`.
    pub label: Option<String>,

    /// Log a warning whenever a connect pushes the live listener count above
    /// this value. Usually points at a forgotten `disconnect`.
    pub warn_listener_count: Option<usize>,

    /// How deep a signal may re-fire itself from its own listeners on one
    /// thread. Fires past this depth are dropped and logged. Values below 1
    /// are treated as 1, so a top-level fire always delivers.
    pub max_dispatch_depth: usize,

    /// Scheduler for deferred work.
    pub scheduler: SchedulerKind,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            label: None,
            warn_listener_count: Some(DEFAULT_WARN_LISTENER_COUNT),
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            scheduler: SchedulerKind::default(),
        }
    }
}

impl SignalConfig {
    /// Set the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the scheduler kind.
    pub fn scheduler(mut self, scheduler: SchedulerKind) -> Self {
        self.scheduler = scheduler;
        self
    }
}
