use std::cell::Cell;
use std::time::{Duration, Instant};

/// Abstraction over where frame timestamps originate from.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Milliseconds between two instants, saturating at zero.
    fn elapsed_ms(&self, earlier: Instant, later: Instant) -> f64 {
        later.saturating_duration_since(earlier).as_secs_f64() * 1000.0
    }
}

/// Clock backed by the system monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to; used to drive the scheduler deterministically.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, step: Duration) {
        self.current.set(self.current.get() + step);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            current: Cell::new(Instant::now()),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.current.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);
        clock.advance(Duration::from_millis(16));
        assert!((clock.elapsed_ms(start, clock.now()) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn elapsed_saturates_when_reversed() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.elapsed_ms(clock.now(), start), 0.0);
    }
}
