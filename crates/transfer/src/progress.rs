//! Rate-limited progress reporting.

use std::time::{Duration, Instant};

/// Minimum gap between intermediate progress reports.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(300);

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Throttles per-file progress callbacks and derives throughput.
///
/// Reported speed is bytes moved *this session* over elapsed session time,
/// so a resumed transfer does not count the bytes it skipped. A report is
/// due when [`PROGRESS_INTERVAL`] has passed since the last one, and exactly
/// once more when the file completes.
#[derive(Debug)]
pub struct ProgressGate {
    started: Instant,
    last_report: Instant,
    baseline: u64,
    finished: bool,
}

impl ProgressGate {
    /// Starts tracking a file that already has `baseline` bytes on disk.
    #[must_use]
    pub fn new(baseline: u64) -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_report: now,
            baseline,
            finished: false,
        }
    }

    /// Returns the MiB/s throughput when a report is due, `None` while
    /// throttled.
    pub fn poll(&mut self, done: u64, total: u64) -> Option<f64> {
        let now = Instant::now();
        let complete = done >= total;
        if complete {
            if self.finished {
                return None;
            }
            self.finished = true;
        } else if now.duration_since(self.last_report) < PROGRESS_INTERVAL {
            return None;
        }
        self.last_report = now;

        let elapsed = now.duration_since(self.started).as_secs_f64();
        let session_bytes = done.saturating_sub(self.baseline);
        if elapsed > 0.0 {
            Some(session_bytes as f64 / elapsed / BYTES_PER_MIB)
        } else {
            Some(0.0)
        }
    }
}
