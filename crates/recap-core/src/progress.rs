//! Job progress reporting.
//!
//! Every background job (transcription, summarization) exposes a fraction in
//! `[0, 1]` through a `tokio::sync::watch` channel. The producing side holds
//! a [`Progress`] and calls [`Progress::report`]; readers poll or await the
//! receiver without ever blocking the producer. Reported values are clamped
//! and monotonically non-decreasing; each new job starts a fresh channel at
//! zero.

use tokio::sync::watch;

/// Producer handle for job progress.
pub struct Progress {
    tx: watch::Sender<f32>,
}

impl Progress {
    /// Create a progress channel starting at 0.
    pub fn new() -> (Self, watch::Receiver<f32>) {
        let (tx, rx) = watch::channel(0.0);
        (Self { tx }, rx)
    }

    /// Create a progress handle nobody is listening to.
    pub fn detached() -> Self {
        Self::new().0
    }

    /// Report a progress fraction. Values are clamped to `[0, 1]`; a value
    /// lower than the current one is ignored so observed progress never
    /// moves backwards.
    pub fn report(&self, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.tx.send_if_modified(|current| {
            if fraction > *current {
                *current = fraction;
                true
            } else {
                false
            }
        });
    }

    /// Subscribe an additional reader.
    pub fn subscribe(&self) -> watch::Receiver<f32> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_monotone_and_clamped() {
        let (progress, rx) = Progress::new();
        progress.report(0.5);
        assert_eq!(*rx.borrow(), 0.5);

        // Lower values are ignored
        progress.report(0.2);
        assert_eq!(*rx.borrow(), 0.5);

        // Values above 1.0 clamp
        progress.report(7.0);
        assert_eq!(*rx.borrow(), 1.0);
    }

    #[test]
    fn detached_progress_does_not_panic() {
        let progress = Progress::detached();
        progress.report(0.3);
        progress.report(1.0);
    }
}
