//! Progress events pushed to the presentation layer

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Sink for workflow progress; the installer only ever pushes into it
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// One step-wise progress update of an install or uninstall run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub step: usize,
    pub total_steps: usize,
    pub message: String,
    /// 0..=100
    pub percentage: u8,
}

/// Trait for progress reporting
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Extension trait to convert ProgressReporter to ProgressCallback
pub trait IntoProgressCallback {
    fn into_callback(self) -> ProgressCallback;
}

impl<T: ProgressReporter + 'static> IntoProgressCallback for T {
    fn into_callback(self) -> ProgressCallback {
        Arc::new(move |event| self.on_progress(&event))
    }
}

/// Prints `[Paso N de M]` lines to stdout.
///
/// Without `verbose` only the first event of each step is printed, which
/// hides the repeated download ticks.
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter {
    pub verbose: bool,
    last_step: AtomicUsize,
}

impl ConsoleProgressReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            last_step: AtomicUsize::new(0),
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_progress(&self, event: &ProgressEvent) {
        let previous = self.last_step.swap(event.step, Ordering::SeqCst);
        if self.verbose || previous != event.step {
            println!(
                "[Paso {} de {}] {:>3}% {}",
                event.step, event.total_steps, event.percentage, event.message
            );
        }
    }
}

/// Null progress reporter that does nothing
#[derive(Debug, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {}

/// Emits events for one workflow run and keeps the reported percentage
/// from ever going backwards, including when several downloads report
/// concurrently.
pub(crate) struct StepReporter {
    total_steps: usize,
    high_water: AtomicU8,
    callback: Option<ProgressCallback>,
}

impl StepReporter {
    pub(crate) fn new(total_steps: usize, callback: Option<ProgressCallback>) -> Self {
        Self {
            total_steps,
            high_water: AtomicU8::new(0),
            callback,
        }
    }

    pub(crate) fn report(&self, step: usize, message: impl Into<String>, percentage: u8) {
        let percentage = percentage.min(100);
        let previous = self.high_water.fetch_max(percentage, Ordering::SeqCst);

        if let Some(ref callback) = self.callback {
            callback(ProgressEvent {
                step,
                total_steps: self.total_steps,
                message: message.into(),
                percentage: previous.max(percentage),
            });
        }
    }
}

/// Human-readable transfer rate
pub fn format_speed(bytes_per_sec: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    if bytes_per_sec >= MB {
        format!("{:.1} MB/s", bytes_per_sec / MB)
    } else if bytes_per_sec >= KB {
        format!("{:.1} KB/s", bytes_per_sec / KB)
    } else {
        format!("{:.0} B/s", bytes_per_sec)
    }
}
