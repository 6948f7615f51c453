use std::f64::consts::PI;

use chaosconfig::{CoefficientSet, DriftConfig, PresetConfig};

/// Golden ratio; `φ³` modulates the angle uniform and the hue rotation.
pub const PHI: f64 = 1.618_033_988_749_895;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl From<CoefficientSet> for Coefficients {
    fn from(set: CoefficientSet) -> Self {
        Self {
            a: set.a,
            b: set.b,
            c: set.c,
            d: set.d,
        }
    }
}

/// Bounded ping-pong rule for the drifting `a` coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftPolicy {
    pub gain: f64,
    pub phase_step: f64,
    pub low: f64,
    pub high: f64,
}

impl DriftPolicy {
    pub fn from_config(drift: &DriftConfig) -> Self {
        Self {
            gain: drift.gain,
            phase_step: drift.phase_step,
            low: drift.a_min + drift.epsilon,
            high: drift.a_max - drift.epsilon,
        }
    }

    pub fn is_active(&self) -> bool {
        self.gain != 0.0
    }

    /// Push magnitude for the given phase.
    pub fn push(&self, phase: f64) -> f64 {
        self.gain * (phase.sin() * PI / 32.0).sin()
    }

    /// Applies one drift step to `state`. Returns true when the direction flipped.
    pub fn apply(&self, state: &mut AttractorState) -> bool {
        let mut step = state.drift_direction * self.push(state.phase);
        let candidate = state.coefficients.a + step;
        let mut reversed = false;
        if candidate < self.low || candidate > self.high {
            state.drift_direction = -state.drift_direction;
            step = -step;
            state.reversals += 1;
            reversed = true;
        }
        state.coefficients.a += step;
        reversed
    }
}

/// Mutable numeric state of one attractor trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct AttractorState {
    pub position: [f64; 2],
    pub seed: [f64; 2],
    pub coefficients: Coefficients,
    /// Scalar `t` driving color, angle and drift.
    pub phase: f64,
    pub drift_direction: f64,
    /// Per-window accumulator `j`.
    pub accumulator: f64,
    /// `sin(phase · φ³)`.
    pub angle: f64,
    pub reseeds: u64,
    pub reversals: u64,
}

impl AttractorState {
    pub fn from_config(config: &PresetConfig) -> Self {
        let coefficients = config
            .coefficients
            .map(Coefficients::from)
            .unwrap_or(Coefficients {
                a: 0.0,
                b: 0.0,
                c: 0.0,
                d: 0.0,
            });
        let phase = config.drift.phase;
        Self {
            position: config.seed,
            seed: config.seed,
            coefficients,
            phase,
            drift_direction: config.drift.direction.signum(),
            accumulator: 0.0,
            angle: angle_for(phase),
            reseeds: 0,
            reversals: 0,
        }
    }

    /// Returns the trajectory to its seed after a non-finite step.
    pub fn reseed(&mut self) {
        self.position = self.seed;
        self.reseeds += 1;
    }

    /// Closes a step window: advances the phase and refreshes the derived angle.
    pub fn advance_phase(&mut self, phase_step: f64) {
        self.phase += phase_step;
        self.angle = angle_for(self.phase);
        self.accumulator = 0.0;
    }
}

pub fn angle_for(phase: f64) -> f64 {
    (phase * PHI.powi(3)).sin()
}
