use std::f64::consts::PI;

use chaosconfig::{PresetConfig, RecurrenceKind};

use crate::attractor::{AttractorState, PHI};
use crate::color::{hue, Rgba};

/// Closed set of trajectory families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recurrence {
    /// Clifford/Pickover style map; sample 0 is the current position.
    Sinusoidal,
    /// Index-parameterised map where every sample is a step output.
    BubbleUniverse { count: usize },
}

impl Recurrence {
    pub fn from_config(config: &PresetConfig) -> Self {
        match config.recurrence {
            RecurrenceKind::Sinusoidal => Recurrence::Sinusoidal,
            RecurrenceKind::BubbleUniverse => Recurrence::BubbleUniverse {
                count: config.particle_count,
            },
        }
    }

    /// Produces the map-space point for sample `index` and moves the state on.
    pub fn sample(&self, state: &mut AttractorState, index: usize) -> [f64; 2] {
        match *self {
            Recurrence::Sinusoidal => {
                let plotted = state.position;
                state.position = sinusoidal_step(state, plotted);
                plotted
            }
            Recurrence::BubbleUniverse { count } => {
                let [x, y] = state.position;
                let i = index as f64;
                let swirl = state.accumulator / (count as f64 * PI) + x;
                let u = (i + y).sin() + swirl.sin();
                let v = (i + y).cos() + swirl.cos();
                let t = state.phase;
                state.position = [u + t, v + t];
                state.accumulator += t;
                [u, v]
            }
        }
    }

    pub fn color(&self, state: &AttractorState, index: usize, count: usize) -> Rgba {
        match self {
            Recurrence::Sinusoidal => {
                let base = index as f64 / count as f64;
                hue(base + (state.angle + 1.0) * 0.5)
            }
            Recurrence::BubbleUniverse { .. } => {
                let i = index as f64;
                hue((i.cos() - (state.phase * PHI.powi(3)).sin()).cos())
            }
        }
    }

    /// Sample 0 of the sinusoidal family is emitted without a recurrence step.
    pub fn emits_seed_first(&self) -> bool {
        matches!(self, Recurrence::Sinusoidal)
    }
}

fn sinusoidal_step(state: &AttractorState, [x, y]: [f64; 2]) -> [f64; 2] {
    let k = &state.coefficients;
    let u = (y * k.b).sin() + k.c * (x * k.b).sin();
    let v = (x * k.a).sin() + k.d * (y * k.a).sin();
    [u, v]
}
