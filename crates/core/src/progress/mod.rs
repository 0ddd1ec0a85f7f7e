//! Progress reporting for integration runs.
//!
//! Every pipeline checkpoint appends a [`ProgressEntry`] to the run's
//! [`ProgressLog`] and hands it to the injected [`ProgressObserver`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Progress value recorded for a failed step.
pub const FAILED_PROGRESS: i8 = -1;

/// A single progress checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressEntry {
    /// Step name (snake_case phase name, `complete` or `error`).
    pub step: String,
    /// Percentage 0-100, or -1 when the step failed.
    pub progress: i8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEntry {
    pub fn new(step: impl Into<String>, progress: i8, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            progress,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.progress == FAILED_PROGRESS
    }
}

impl fmt::Display for ProgressEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}% {}", self.step, self.progress, self.message)
    }
}

/// Append-only list of checkpoints for one run.
#[derive(Debug, Clone, Default)]
pub struct ProgressLog {
    entries: Vec<ProgressEntry>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ProgressEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ProgressEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&ProgressEntry> {
        self.entries.last()
    }

    /// The trailing `n` entries, oldest first.
    pub fn last(&self, n: usize) -> Vec<ProgressEntry> {
        let start = self.entries.len().saturating_sub(n);
        self.entries[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Receives progress checkpoints synchronously as the pipeline advances.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, entry: &ProgressEntry);
}

/// Observer that ignores every checkpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _entry: &ProgressEntry) {}
}

/// Observer that writes checkpoints to the tracing log.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    run_id: String,
}

impl TracingObserver {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }
}

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, entry: &ProgressEntry) {
        if entry.is_failure() {
            warn!(run_id = %self.run_id, step = %entry.step, "{}", entry.message);
        } else {
            info!(
                run_id = %self.run_id,
                step = %entry.step,
                progress = entry.progress,
                "{}",
                entry.message
            );
        }
    }
}

/// Callback type accepted by [`CallbackObserver`].
pub type ProgressCallback = Arc<dyn Fn(&ProgressEntry) + Send + Sync>;

/// Observer that forwards checkpoints to a closure.
#[derive(Clone)]
pub struct CallbackObserver {
    callback: ProgressCallback,
}

impl CallbackObserver {
    pub fn new(callback: ProgressCallback) -> Self {
        Self { callback }
    }
}

impl fmt::Debug for CallbackObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackObserver").finish_non_exhaustive()
    }
}

impl ProgressObserver for CallbackObserver {
    fn on_progress(&self, entry: &ProgressEntry) {
        (self.callback)(entry);
    }
}
