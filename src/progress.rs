//! Progress hooks for long single-pass operations.
//!
//! Progress is a side channel only: observers never influence results. The
//! [`LogProgress`] observer forwards progress to `tracing` at a fixed cadence.

/// Receives `(consumed, total)` updates from a streaming operation.
///
/// `total` is `None` when the input length is not known up front.
pub trait ProgressObserver {
    fn on_progress(&mut self, consumed: usize, total: Option<usize>);

    /// Called once after the last item.
    fn on_finish(&mut self, consumed: usize) {
        let _ = consumed;
    }
}

/// Observer that ignores every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _consumed: usize, _total: Option<usize>) {}
}

/// Fraction of the input consumed, clamped to `[0, 1]`.
///
/// An unknown or zero total reports `0.0`.
#[must_use]
pub fn fraction(consumed: usize, total: Option<usize>) -> f64 {
    match total {
        Some(t) if t > 0 => (consumed as f64 / t as f64).min(1.0),
        _ => 0.0,
    }
}

/// Emits a `tracing::debug!` event every `every` items and a summary at the end.
#[derive(Clone, Debug)]
pub struct LogProgress {
    label: String,
    every: usize,
}

impl LogProgress {
    pub fn new<S: Into<String>>(label: S, every: usize) -> Self {
        Self {
            label: label.into(),
            every: every.max(1),
        }
    }

    /// Whether an event is emitted after `consumed` items.
    #[must_use]
    pub fn is_due(&self, consumed: usize) -> bool {
        consumed > 0 && consumed % self.every == 0
    }
}

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, consumed: usize, total: Option<usize>) {
        if self.is_due(consumed) {
            tracing::debug!(
                label = %self.label,
                consumed,
                pct = %format!("{:.1}", fraction(consumed, total) * 100.0),
                "progress"
            );
        }
    }

    fn on_finish(&mut self, consumed: usize) {
        tracing::debug!(label = %self.label, consumed, "done");
    }
}
