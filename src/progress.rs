//! Progress reporting.
//!
//! [`ProgressCallback`] receives a [`ProgressInfo`] snapshot as frames are
//! written. Callbacks observe the run; they cannot stop it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framestitch::{AssemblyError, AssemblyOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% ({}/{})", info.current, info.total);
//!         }
//!     }
//! }
//!
//! let options = AssemblyOptions::new()
//!     .with_source_dir("frames")
//!     .with_progress(Arc::new(PrintProgress));
//! framestitch::assemble(&options)?;
//! # Ok::<(), AssemblyError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A snapshot of assembly progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames written so far.
    pub current: u64,
    /// Frames discovered for this run.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0). `None` when there are no frames.
    pub percentage: Option<f32>,
    /// Wall-clock time since the writer opened.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Source file of the frame just written.
    pub current_path: Option<PathBuf>,
}

/// Trait for receiving progress updates during assembly.
///
/// Implementations must be [`Send`] and [`Sync`] so options carrying them
/// can be shared freely.
pub trait ProgressCallback: Send + Sync {
    /// Called after every `batch_size` frames and once at the end.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. Used when no callback is set.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one run and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u64,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: u64, batch_size: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one written frame; report if the batch threshold is reached.
    pub(crate) fn advance(&mut self, path: &Path) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(Some(path.to_path_buf()));
            self.items_since_last_report = 0;
        }
    }

    /// Emit a final report unless the last frame already produced one.
    pub(crate) fn finish(&mut self) {
        if self.items_since_last_report > 0 || self.current == 0 {
            self.report(None);
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn report(&self, current_path: Option<PathBuf>) {
        let elapsed = self.start_time.elapsed();

        let percentage = (self.total > 0)
            .then(|| (self.current as f32 / self.total as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            let remaining = self.total.saturating_sub(self.current);
            let per_item = elapsed.div_f64(self.current as f64);
            Some(per_item.mul_f64(remaining as f64))
        } else {
            None
        };

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_path,
        };

        self.callback.on_progress(&info);
    }
}
