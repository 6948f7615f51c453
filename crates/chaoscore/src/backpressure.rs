use chaosconfig::PresetConfig;

/// Cumulative emitted-point counter that schedules surface clears.
///
/// A clear fires when the count *before* the call exceeds the threshold; the
/// counter then drops by exactly the threshold so the overshoot carries over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackpressureController {
    emitted_since_clear: u64,
    threshold: u64,
    drift_push_level: u64,
    clears: u64,
}

impl BackpressureController {
    pub fn new(threshold: u64, drift_push_level: u64) -> Self {
        Self {
            emitted_since_clear: 0,
            threshold,
            drift_push_level,
            clears: 0,
        }
    }

    pub fn from_config(config: &PresetConfig) -> Self {
        Self::new(config.backpressure.threshold, config.drift_push_level())
    }

    /// Records `n` emitted points. Returns true when the surface must be cleared.
    pub fn record_emission(&mut self, n: u64) -> bool {
        let fire = self.emitted_since_clear > self.threshold;
        let mut next = self.emitted_since_clear.saturating_add(n);
        if fire {
            next -= self.threshold;
            self.clears += 1;
        }
        self.emitted_since_clear = next;
        fire
    }

    /// Secondary gate for the attractor's drift push.
    pub fn drift_push_due(&self) -> bool {
        self.emitted_since_clear > self.drift_push_level
    }

    pub fn emitted_since_clear(&self) -> u64 {
        self.emitted_since_clear
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn clears(&self) -> u64 {
        self.clears
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_pre_call_value() {
        let mut controller = BackpressureController::new(10, 3);
        assert!(!controller.record_emission(11));
        assert_eq!(controller.emitted_since_clear(), 11);
        assert!(controller.record_emission(4));
        assert_eq!(controller.emitted_since_clear(), 5);
        assert_eq!(controller.clears(), 1);
    }

    #[test]
    fn exact_threshold_does_not_fire() {
        let mut controller = BackpressureController::new(10, 3);
        controller.record_emission(10);
        assert!(!controller.record_emission(1));
        assert!(controller.record_emission(0));
        assert_eq!(controller.emitted_since_clear(), 1);
    }

    #[test]
    fn drift_gate_opens_above_level() {
        let mut controller = BackpressureController::new(100, 3);
        controller.record_emission(3);
        assert!(!controller.drift_push_due());
        controller.record_emission(1);
        assert!(controller.drift_push_due());
    }
}
