//! Progress reporting and cooperative cancellation for long-running builds.
//!
//! A build declares its total amount of work up front, enters frames as it
//! goes, and polls [`Progress::should_cancel`] at least once per grid row.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// A snapshot handed to a [`ProgressSink`] whenever a frame is entered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressUpdate<'a> {
    pub completed: f64,
    pub total: f64,
    pub message: &'a str,
}

impl ProgressUpdate<'_> {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total <= 0.0 {
            return 1.0;
        }
        (self.completed / self.total).clamp(0.0, 1.0)
    }
}

/// Receives progress updates.
pub trait ProgressSink {
    fn report(&mut self, update: ProgressUpdate<'_>);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressUpdate<'_>),
{
    fn report(&mut self, update: ProgressUpdate<'_>) {
        self(update)
    }
}

/// Sink that discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _update: ProgressUpdate<'_>) {}
}

/// Progress of one build: the total work, how much is done, the sink to
/// report to, and the cancellation flag to poll.
pub struct Progress<'a> {
    total: f64,
    completed: f64,
    cancel: CancellationToken,
    sink: &'a mut dyn ProgressSink,
}

impl<'a> Progress<'a> {
    pub fn new(total: f64, cancel: CancellationToken, sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            total,
            completed: 0.0,
            cancel,
            sink,
        }
    }

    /// Mark `amount` units of work as done and report.
    pub fn enter_frame(&mut self, amount: f64, message: &str) {
        self.completed = (self.completed + amount).min(self.total.max(self.completed));
        self.sink.report(ProgressUpdate {
            completed: self.completed,
            total: self.total,
            message,
        });
    }

    pub fn should_cancel(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn completed(&self) -> f64 {
        self.completed
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}
