//! Displayed progress and the estimators feeding it
//!
//! Estimators only ever raise `target` through a `max` fold, so their
//! arrival order does not matter. The render step is the only writer of
//! `current` and never moves it past `target`; the completion ramp is the
//! one exception and drives `current` to exactly 100.

use crate::config::EasingConfig;
use std::time::Duration;

/// Upper bound of the progress scale
pub const FULL: f64 = 100.0;

/// Eased-step constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    /// Fraction of the remaining gap covered per frame
    pub rate: f64,
    /// Smallest step taken while a gap remains
    pub min_step: f64,
}

impl Easing {
    pub const fn new(rate: f64, min_step: f64) -> Self {
        Self { rate, min_step }
    }

    /// Step toward `goal` from `from`: `max(min_step, gap * rate)`
    pub fn step(&self, from: f64, goal: f64) -> f64 {
        let gap = goal - from;
        (gap * self.rate).max(self.min_step)
    }

    /// Render-loop easing from config
    pub fn running(config: &EasingConfig) -> Self {
        Self::new(config.rate, config.min_step)
    }

    /// Completion-ramp easing from config
    pub fn completion(config: &EasingConfig) -> Self {
        Self::new(config.completion_rate, config.completion_min_step)
    }
}

/// Synthetic page-load progress
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadProgress {
    current: f64,
    target: f64,
}

impl LoadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value shown on the indicator
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Highest estimate folded so far
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Fold an estimate into `target`; returns true if it rose
    pub fn fold(&mut self, estimate: f64) -> bool {
        let estimate = estimate.clamp(0.0, FULL);
        if estimate > self.target {
            self.target = estimate;
            true
        } else {
            false
        }
    }

    /// One render step toward `target`; returns the new value if it moved
    pub fn advance(&mut self, easing: Easing) -> Option<f64> {
        if self.current >= self.target {
            return None;
        }
        let step = easing.step(self.current, self.target);
        self.current = (self.current + step).min(self.target);
        Some(self.current)
    }

    /// One completion-ramp step toward 100, ignoring `target`
    pub fn advance_to_full(&mut self, easing: Easing) -> Option<f64> {
        if self.is_full() {
            return None;
        }
        let step = easing.step(self.current, FULL);
        self.current = (self.current + step).min(FULL);
        Some(self.current)
    }

    pub fn is_full(&self) -> bool {
        self.current >= FULL
    }
}

/// Elapsed-time estimate: `min(elapsed / min_duration, cap / 100) * 100`
pub fn time_estimate(elapsed: Duration, min_duration: Duration, cap: f64) -> f64 {
    if min_duration.is_zero() {
        return cap;
    }
    let ratio = elapsed.as_secs_f64() / min_duration.as_secs_f64();
    (ratio * FULL).min(cap)
}

/// Resource-settlement estimate: `floor + span * settled / total`
pub fn resource_estimate(settled: usize, total: usize, floor: f64, span: f64) -> f64 {
    if total == 0 {
        return floor;
    }
    let ratio = (settled.min(total) as f64) / (total as f64);
    floor + span * ratio
}

/// Text form of a progress value, e.g. `"42%"`
pub fn progress_label(value: f64) -> String {
    format!("{}%", value.round() as u32)
}
