//! Progress reporting.
//!
//! [`ProgressCallback`] lets callers observe how far an
//! [`ImageBagProcessor`](crate::ImageBagProcessor) has got through a bag.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bagshot::{ImageBagProcessor, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}: {} frames", info.bag.display(), info.dispatched);
//!     }
//! }
//!
//! let mut processor = ImageBagProcessor::new("/camera/image_raw")
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(100);
//! processor.process_bag("recording.bag")?;
//! # Ok::<(), bagshot::ExtractError>(())
//! ```

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

/// A snapshot of progress through one bag.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Bag currently being processed.
    pub bag: PathBuf,
    /// Frames handed to the registered callbacks so far.
    pub dispatched: u64,
    /// Capture timestamp of the most recent frame, in nanoseconds.
    pub current_timestamp_ns: Option<u64>,
    /// Wall-clock time since the bag was opened.
    pub elapsed: Duration,
    /// `true` for the final report of a bag.
    pub finished: bool,
}

/// Trait for receiving progress updates while a bag is processed.
///
/// Progress callbacks are infallible; they observe but cannot halt the
/// operation.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once when a bag is done.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Internal helper that tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    bag: PathBuf,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
    last_timestamp_ns: Option<u64>,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, bag: PathBuf, batch_size: u64) -> Self {
        Self {
            callback,
            bag,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
            last_timestamp_ns: None,
        }
    }

    /// Record one dispatched frame and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, timestamp_ns: u64) {
        self.current += 1;
        self.items_since_last_report += 1;
        self.last_timestamp_ns = Some(timestamp_ns);

        if self.items_since_last_report >= self.batch_size {
            self.report(false);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final progress report.
    pub(crate) fn finish(&mut self) {
        self.report(true);
    }

    fn report(&self, finished: bool) {
        let info = ProgressInfo {
            bag: self.bag.clone(),
            dispatched: self.current,
            current_timestamp_ns: self.last_timestamp_ns,
            elapsed: self.start_time.elapsed(),
            finished,
        };
        self.callback.on_progress(&info);
    }
}
