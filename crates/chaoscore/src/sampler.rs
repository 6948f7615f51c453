use std::num::NonZeroUsize;

use chaosconfig::PresetConfig;
use tracing::warn;

use crate::attractor::{AttractorState, DriftPolicy};
use crate::recurrence::Recurrence;
use crate::transform::ScreenTransform;

/// One screen-space point produced by the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: [f32; 2],
    pub color: [f32; 4],
    pub id: u32,
}

/// Advances an [`AttractorState`] and maps each step into screen space.
///
/// Drift updates happen once per step window: the `a` push (when the gate
/// passed to [`advance`](Self::advance) is open), then the phase, angle and
/// accumulator update. Windows may span frames when the window is longer than
/// the per-frame iteration count.
#[derive(Debug, Clone)]
pub struct TrajectorySampler {
    state: AttractorState,
    recurrence: Recurrence,
    transform: ScreenTransform,
    drift: DriftPolicy,
    step_window: usize,
    window_fill: usize,
}

impl TrajectorySampler {
    pub fn from_config(config: &PresetConfig) -> Self {
        Self {
            state: AttractorState::from_config(config),
            recurrence: Recurrence::from_config(config),
            transform: ScreenTransform::from_viewport(&config.viewport),
            drift: DriftPolicy::from_config(&config.drift),
            step_window: config.step_window().max(1),
            window_fill: 0,
        }
    }

    pub fn state(&self) -> &AttractorState {
        &self.state
    }

    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    /// Replaces `out` with exactly `iterations` samples.
    ///
    /// A step that leaves the finite range in map or clip space reseeds the
    /// trajectory and emits the seed in its place.
    pub fn advance(
        &mut self,
        iterations: NonZeroUsize,
        drift_enabled: bool,
        out: &mut Vec<Sample>,
    ) {
        let count = iterations.get();
        out.clear();
        let mut diverged = 0u64;

        for index in 0..count {
            let point = self.recurrence.sample(&mut self.state, index);
            let mut position = self.transform.apply(point);
            let emitted_finite = is_finite(point) && position.iter().all(|c| c.is_finite());
            if !emitted_finite || !is_finite(self.state.position) {
                self.state.reseed();
                diverged += 1;
                if !emitted_finite {
                    position = self.transform.apply(self.state.seed);
                }
            }

            out.push(Sample {
                position,
                color: self.recurrence.color(&self.state, index, count),
                id: index as u32,
            });

            self.window_fill += 1;
            if self.window_fill >= self.step_window {
                self.close_window(drift_enabled);
            }
        }

        if diverged > 0 {
            warn!(
                diverged,
                total_reseeds = self.state.reseeds,
                "trajectory left the finite range; reseeded"
            );
        }
    }

    fn close_window(&mut self, drift_enabled: bool) {
        self.window_fill = 0;
        if drift_enabled && self.drift.is_active() {
            self.drift.apply(&mut self.state);
        }
        self.state.advance_phase(self.drift.phase_step);
    }
}

fn is_finite([x, y]: [f64; 2]) -> bool {
    x.is_finite() && y.is_finite()
}
