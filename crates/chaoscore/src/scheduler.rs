use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{ChaosError, DeviceError};
use crate::render_core::RenderCore;
use crate::telemetry::{FpsReport, RunSummary};
use crate::vertex::PointVertex;

/// Lifecycle of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Uninitialized,
    Ready,
    Running,
    Paused,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SchedulerState::Uninitialized => "uninitialized",
            SchedulerState::Ready => "ready",
            SchedulerState::Running => "running",
            SchedulerState::Paused => "paused",
            SchedulerState::ShuttingDown => "shutting down",
            SchedulerState::Terminated => "terminated",
        };
        f.write_str(label)
    }
}

/// Points submitted for one draw call.
#[derive(Debug, Clone, Copy)]
pub struct PointBatch<'a> {
    pub vertices: &'a [PointVertex],
    /// Same data as `vertices`, viewed as raw bytes for upload.
    pub bytes: &'a [u8],
    /// `sin(phase · φ³)`, uploaded as the angle uniform.
    pub angle: f32,
}

/// Graphics capabilities the frame loop needs from its host.
pub trait RenderDevice {
    fn check_device_error(&mut self) -> Result<(), DeviceError>;
    /// Discards accumulated contents before the next draw.
    fn clear(&mut self);
    fn draw_points(&mut self, batch: PointBatch<'_>) -> Result<(), DeviceError>;
    fn present(&mut self) -> Result<(), DeviceError>;
    fn release(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Rendered {
        cleared: bool,
        report: Option<FpsReport>,
    },
    Paused,
    /// Nothing was drawn; the scheduler is winding down.
    Idle,
}

#[derive(Debug)]
pub struct FrameScheduler<C: Clock = SystemClock> {
    state: SchedulerState,
    clock: C,
    last_frame: Option<Instant>,
    started_at: Option<Instant>,
    run_limit: Option<Duration>,
}

impl FrameScheduler<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for FrameScheduler<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FrameScheduler<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: SchedulerState::Uninitialized,
            clock,
            last_frame: None,
            started_at: None,
            run_limit: None,
        }
    }

    /// Stops the loop once this much wall time has passed since `start`.
    pub fn with_run_limit(mut self, limit: Option<Duration>) -> Self {
        self.run_limit = limit;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == SchedulerState::Paused
    }

    pub fn is_winding_down(&self) -> bool {
        matches!(
            self.state,
            SchedulerState::ShuttingDown | SchedulerState::Terminated
        )
    }

    fn invalid(&self, action: &'static str) -> ChaosError {
        ChaosError::InvalidTransition {
            from: self.state,
            action,
        }
    }

    pub fn initialize<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
    ) -> Result<(), ChaosError> {
        if self.state != SchedulerState::Uninitialized {
            return Err(self.invalid("initialize"));
        }
        device.check_device_error()?;
        self.state = SchedulerState::Ready;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ChaosError> {
        if self.state != SchedulerState::Ready {
            return Err(self.invalid("start"));
        }
        let now = self.clock.now();
        self.started_at = Some(now);
        self.last_frame = Some(now);
        self.state = SchedulerState::Running;
        info!("frame loop started");
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> Result<SchedulerState, ChaosError> {
        self.state = match self.state {
            SchedulerState::Running => {
                info!("paused");
                SchedulerState::Paused
            }
            SchedulerState::Paused => {
                self.last_frame = Some(self.clock.now());
                info!("resumed");
                SchedulerState::Running
            }
            _ => return Err(self.invalid("toggle pause")),
        };
        Ok(self.state)
    }

    /// Runs one frame. Paused or winding-down schedulers touch neither `core` nor `device`.
    pub fn tick<D: RenderDevice + ?Sized>(
        &mut self,
        core: &mut RenderCore,
        device: &mut D,
    ) -> Result<FrameOutcome, ChaosError> {
        match self.state {
            SchedulerState::Running => {}
            SchedulerState::Paused => return Ok(FrameOutcome::Paused),
            SchedulerState::ShuttingDown | SchedulerState::Terminated => {
                return Ok(FrameOutcome::Idle)
            }
            SchedulerState::Uninitialized | SchedulerState::Ready => {
                return Err(self.invalid("tick"))
            }
        }

        if self.run_limit_reached() {
            info!("run limit reached");
            self.state = SchedulerState::ShuttingDown;
            return Ok(FrameOutcome::Idle);
        }

        let drift_enabled = core.backpressure.drift_push_due();
        core.sampler
            .advance(core.iterations, drift_enabled, &mut core.samples);
        core.buffer.repack(&core.samples);

        let emitted = core.iterations.get() as u64;
        let cleared = core.backpressure.record_emission(emitted);
        if cleared {
            debug!(clears = core.backpressure.clears(), "backpressure clear");
        }
        if cleared || !core.accumulate {
            device.clear();
        }

        if cfg!(debug_assertions) {
            device.check_device_error()?;
        }
        device.draw_points(PointBatch {
            vertices: core.buffer.vertices(),
            bytes: core.buffer.as_bytes(),
            angle: core.sampler.state().angle as f32,
        })?;
        device.present()?;

        let now = self.clock.now();
        let since = self.last_frame.unwrap_or(now);
        self.last_frame = Some(now);
        let report = core
            .telemetry
            .record_frame(now.saturating_duration_since(since));
        if let Some(report) = report {
            debug!(
                fps = report.fps,
                worst_latency_ms = report.worst_latency_ms,
                a = core.sampler.state().coefficients.a,
                "frame timing"
            );
        }

        Ok(FrameOutcome::Rendered { cleared, report })
    }

    /// Re-presents retained contents without advancing the animation.
    pub fn refresh<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
    ) -> Result<(), ChaosError> {
        match self.state {
            SchedulerState::Running | SchedulerState::Paused => {
                device.present()?;
                Ok(())
            }
            _ => Err(self.invalid("refresh")),
        }
    }

    pub fn request_shutdown(&mut self) -> Result<(), ChaosError> {
        match self.state {
            SchedulerState::Ready | SchedulerState::Running | SchedulerState::Paused => {
                self.state = SchedulerState::ShuttingDown;
                Ok(())
            }
            SchedulerState::ShuttingDown => Ok(()),
            _ => Err(self.invalid("shut down")),
        }
    }

    pub fn finish<D: RenderDevice + ?Sized>(
        &mut self,
        core: &RenderCore,
        device: &mut D,
    ) -> Result<RunSummary, ChaosError> {
        if self.state != SchedulerState::ShuttingDown {
            return Err(self.invalid("finish"));
        }
        let summary = core.telemetry.summary();
        info!(
            frames = summary.total_frames,
            seconds = summary.total_secs,
            average_fps = summary.average_fps,
            clears = core.backpressure.clears(),
            reseeds = core.sampler.state().reseeds,
            "rendered {} frames over {:.2}s",
            summary.total_frames,
            summary.total_secs
        );
        device.release();
        self.state = SchedulerState::Terminated;
        Ok(summary)
    }

    fn run_limit_reached(&self) -> bool {
        match (self.run_limit, self.started_at) {
            (Some(limit), Some(started)) => {
                self.clock.now().saturating_duration_since(started) >= limit
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[derive(Default)]
    struct RecordingDevice {
        fail_check: bool,
        clears: usize,
        draws: usize,
        presents: usize,
        released: bool,
    }

    impl RenderDevice for RecordingDevice {
        fn check_device_error(&mut self) -> Result<(), DeviceError> {
            if self.fail_check {
                Err(DeviceError::Validation("broken pipeline".into()))
            } else {
                Ok(())
            }
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn draw_points(&mut self, batch: PointBatch<'_>) -> Result<(), DeviceError> {
            assert_eq!(batch.bytes.len(), batch.vertices.len() * PointVertex::STRIDE);
            self.draws += 1;
            Ok(())
        }

        fn present(&mut self) -> Result<(), DeviceError> {
            self.presents += 1;
            Ok(())
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    fn core(particles: usize) -> RenderCore {
        let mut config = chaosconfig::builtin("dream").unwrap();
        config.particle_count = particles;
        RenderCore::from_config(&config).unwrap()
    }

    #[test]
    fn failed_device_check_keeps_scheduler_uninitialized() {
        let mut scheduler = FrameScheduler::with_clock(ManualClock::new());
        let mut device = RecordingDevice {
            fail_check: true,
            ..Default::default()
        };
        let err = scheduler.initialize(&mut device).unwrap_err();
        assert!(matches!(err, ChaosError::Device(DeviceError::Validation(_))));
        assert_eq!(scheduler.state(), SchedulerState::Uninitialized);
    }

    #[test]
    fn rejects_out_of_order_transitions() {
        let mut scheduler = FrameScheduler::with_clock(ManualClock::new());
        assert!(matches!(
            scheduler.start(),
            Err(ChaosError::InvalidTransition {
                from: SchedulerState::Uninitialized,
                ..
            })
        ));
        assert!(scheduler.toggle_pause().is_err());
        let mut device = RecordingDevice::default();
        let mut core = core(8);
        assert!(scheduler.tick(&mut core, &mut device).is_err());
        scheduler.initialize(&mut device).unwrap();
        assert!(scheduler.initialize(&mut device).is_err());
    }

    #[test]
    fn paused_ticks_leave_core_and_device_untouched() {
        let clock = ManualClock::new();
        let mut scheduler = FrameScheduler::with_clock(&clock);
        let mut device = RecordingDevice::default();
        let mut core = core(16);
        scheduler.initialize(&mut device).unwrap();
        scheduler.start().unwrap();

        scheduler.tick(&mut core, &mut device).unwrap();
        assert_eq!(scheduler.toggle_pause().unwrap(), SchedulerState::Paused);
        let snapshot = core.clone();
        let draws = device.draws;
        for _ in 0..5 {
            clock.advance(Duration::from_millis(16));
            assert_eq!(
                scheduler.tick(&mut core, &mut device).unwrap(),
                FrameOutcome::Paused
            );
        }
        assert_eq!(device.draws, draws);
        assert_eq!(device.clears, 0);
        assert_eq!(core.sampler().state(), snapshot.sampler().state());
        assert_eq!(core.buffer().vertices(), snapshot.buffer().vertices());
        assert_eq!(core.telemetry(), snapshot.telemetry());

        scheduler.refresh(&mut device).unwrap();
        assert_eq!(device.presents, 2);
    }

    #[test]
    fn resume_measures_latency_from_resume_instant() {
        let clock = ManualClock::new();
        let mut scheduler = FrameScheduler::with_clock(&clock);
        let mut device = RecordingDevice::default();
        let mut core = core(4);
        scheduler.initialize(&mut device).unwrap();
        scheduler.start().unwrap();
        scheduler.toggle_pause().unwrap();
        clock.advance(Duration::from_secs(5));
        scheduler.toggle_pause().unwrap();
        clock.advance(Duration::from_millis(20));
        scheduler.tick(&mut core, &mut device).unwrap();
        let summary = core.telemetry().summary();
        assert!((summary.total_secs - 0.02).abs() < 1e-9);
    }

    #[test]
    fn clears_every_frame_when_not_accumulating() {
        let mut config = chaosconfig::builtin("bubble").unwrap();
        config.particle_count = 32;
        let mut core = RenderCore::from_config(&config).unwrap();
        let mut scheduler = FrameScheduler::with_clock(ManualClock::new());
        let mut device = RecordingDevice::default();
        scheduler.initialize(&mut device).unwrap();
        scheduler.start().unwrap();
        for _ in 0..3 {
            let outcome = scheduler.tick(&mut core, &mut device).unwrap();
            assert!(matches!(outcome, FrameOutcome::Rendered { cleared: false, .. }));
        }
        assert_eq!(device.clears, 3);
        assert_eq!(device.draws, 3);
    }

    #[test]
    fn backpressure_clear_reaches_the_device() {
        let mut config = chaosconfig::builtin("dream").unwrap();
        config.particle_count = 10;
        config.backpressure.threshold = 25;
        let mut core = RenderCore::from_config(&config).unwrap();
        let mut scheduler = FrameScheduler::with_clock(ManualClock::new());
        let mut device = RecordingDevice::default();
        scheduler.initialize(&mut device).unwrap();
        scheduler.start().unwrap();

        let cleared: Vec<bool> = (0..5)
            .map(|_| match scheduler.tick(&mut core, &mut device).unwrap() {
                FrameOutcome::Rendered { cleared, .. } => cleared,
                other => panic!("unexpected outcome {other:?}"),
            })
            .collect();
        assert_eq!(cleared, vec![false, false, false, true, false]);
        assert_eq!(device.clears, 1);
        assert_eq!(core.backpressure().emitted_since_clear(), 25);
    }

    #[test]
    fn run_limit_moves_to_shutdown() {
        let clock = ManualClock::new();
        let mut scheduler =
            FrameScheduler::with_clock(&clock).with_run_limit(Some(Duration::from_secs(10)));
        let mut device = RecordingDevice::default();
        let mut core = core(4);
        scheduler.initialize(&mut device).unwrap();
        scheduler.start().unwrap();
        clock.advance(Duration::from_secs(9));
        assert!(matches!(
            scheduler.tick(&mut core, &mut device).unwrap(),
            FrameOutcome::Rendered { .. }
        ));
        clock.advance(Duration::from_secs(1));
        assert_eq!(
            scheduler.tick(&mut core, &mut device).unwrap(),
            FrameOutcome::Idle
        );
        assert!(scheduler.is_winding_down());

        let summary = scheduler.finish(&core, &mut device).unwrap();
        assert_eq!(summary.total_frames, 1);
        assert!(device.released);
        assert_eq!(scheduler.state(), SchedulerState::Terminated);
        assert!(scheduler.request_shutdown().is_err());
    }

    #[test]
    fn finish_requires_shutdown_request() {
        let mut scheduler = FrameScheduler::with_clock(ManualClock::new());
        let mut device = RecordingDevice::default();
        let core = core(4);
        scheduler.initialize(&mut device).unwrap();
        scheduler.start().unwrap();
        assert!(scheduler.finish(&core, &mut device).is_err());
        scheduler.request_shutdown().unwrap();
        scheduler.request_shutdown().unwrap();
        assert!(scheduler.finish(&core, &mut device).is_ok());
    }
}
