use std::time::Duration;

/// Per-second throughput snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsReport {
    /// Frames completed in the window that just closed.
    pub fps: u32,
    pub worst_latency_ms: f64,
}

/// Lifetime totals logged at shutdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub total_frames: u64,
    pub total_secs: f64,
    pub average_fps: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTelemetry {
    total_frames: u64,
    total_elapsed_ms: f64,
    window_frames: u32,
    window_elapsed_ms: f64,
    worst_latency_ms: f64,
}

const REPORT_INTERVAL_MS: f64 = 1000.0;

impl FrameTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame's latency. Returns a report whenever a rolling second closes.
    ///
    /// The frame that closes a window is counted towards the next one.
    pub fn record_frame(&mut self, elapsed: Duration) -> Option<FpsReport> {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if elapsed_ms > self.worst_latency_ms {
            self.worst_latency_ms = elapsed_ms;
        }
        self.window_elapsed_ms += elapsed_ms;
        self.total_elapsed_ms += elapsed_ms;

        let report = if self.window_elapsed_ms >= REPORT_INTERVAL_MS {
            let report = FpsReport {
                fps: self.window_frames,
                worst_latency_ms: self.worst_latency_ms,
            };
            self.window_frames = 0;
            self.window_elapsed_ms = 0.0;
            self.worst_latency_ms = 0.0;
            Some(report)
        } else {
            None
        };

        self.window_frames += 1;
        self.total_frames += 1;
        report
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn summary(&self) -> RunSummary {
        let total_secs = self.total_elapsed_ms / 1000.0;
        let average_fps = if total_secs > 0.0 {
            self.total_frames as f64 / total_secs
        } else {
            0.0
        };
        RunSummary {
            total_frames: self.total_frames,
            total_secs,
            average_fps,
        }
    }
}
