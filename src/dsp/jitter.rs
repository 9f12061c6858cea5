//! Jitter filter: suppresses oscillatory sensor chatter.
//!
//! A sliding time window of recent samples is inspected on every update.
//! Small peak-to-peak motion that keeps reversing direction is sensor
//! noise; anything else is passed through as genuine motion.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::JitterConfig;

/// One raw sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub angle_deg: f64,
    pub timestamp_s: f64,
}

impl AngleSample {
    pub fn new(angle_deg: f64, timestamp_s: f64) -> Self {
        AngleSample {
            angle_deg,
            timestamp_s,
        }
    }
}

/// A windowed sample together with the stabilized angle it produced.
#[derive(Debug, Clone, Copy)]
struct Entry {
    sample: AngleSample,
    stabilized: f64,
}

/// Upper bound on windowed samples, for hosts that repeat timestamps.
const MAX_HISTORY: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct JitterFilter {
    history: VecDeque<Entry>,
    /// Angle held while the window is classified as jitter.
    held: Option<f64>,
    /// Last angle the lid settled at. Survives history resets and gaps.
    rest: Option<f64>,
    /// Previous raw angle, even when it has left the window.
    last_raw: Option<f64>,
}

impl JitterFilter {
    pub fn new() -> Self {
        JitterFilter {
            history: VecDeque::new(),
            held: None,
            rest: None,
            last_raw: None,
        }
    }

    /// Feed one sample and return the stabilized angle.
    ///
    /// With the filter disabled the raw angle is returned and the history
    /// is left untouched.
    pub fn process(&mut self, sample: AngleSample, config: &JitterConfig) -> f64 {
        let angle = sample.angle_deg;
        if !config.enabled {
            self.held = None;
            self.rest = Some(angle);
            self.last_raw = Some(angle);
            return angle;
        }

        self.history.push_back(Entry {
            sample,
            stabilized: angle,
        });
        self.evict(sample.timestamp_s, config.time_window_ms / 1000.0);

        let stabilized = if self.is_jitter(config) {
            *self.held.get_or_insert_with(|| {
                // Settle on the value in effect when the oscillation began.
                let anchor = self
                    .rest
                    .or_else(|| self.history.front().map(|e| e.stabilized))
                    .unwrap_or(angle);
                debug!("jitter detected, holding {anchor:.2} deg");
                anchor
            })
        } else {
            if self.held.take().is_some() {
                debug!("jitter released at {angle:.2} deg");
            }
            self.track_rest(angle, config);
            angle
        };

        self.last_raw = Some(angle);
        if let Some(last) = self.history.back_mut() {
            last.stabilized = stabilized;
        }
        stabilized
    }

    /// Forget all windowed samples.
    ///
    /// The last resting angle is kept, so an oscillation that starts right
    /// after a reset still settles where the lid was.
    pub fn reset(&mut self) {
        self.history.clear();
        self.held = None;
    }

    /// Forget everything, including the resting angle.
    pub fn clear(&mut self) {
        self.reset();
        self.rest = None;
        self.last_raw = None;
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Whether the last decision suppressed motion.
    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    /// Angle the filter would hold if jitter started now.
    pub fn rest_angle(&self) -> Option<f64> {
        self.rest
    }

    /// The rest angle follows the lid while it is still or moving further
    /// than the jitter amplitude. Small significant steps around it leave
    /// it alone: they may be the start of an oscillation.
    fn track_rest(&mut self, angle: f64, config: &JitterConfig) {
        let still = self
            .last_raw
            .is_some_and(|prev| (angle - prev).abs() < config.min_delta_deg);
        let moved_away = self
            .rest
            .is_none_or(|rest| (angle - rest).abs() > config.amplitude_deg);
        if still || moved_away {
            self.rest = Some(angle);
        }
    }

    fn evict(&mut self, now_s: f64, window_s: f64) {
        while let Some(front) = self.history.front() {
            if now_s - front.sample.timestamp_s > window_s || self.history.len() > MAX_HISTORY {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_jitter(&self, config: &JitterConfig) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        peak_to_peak(&self.history) <= config.amplitude_deg
            && sign_flips(&self.history, config.min_delta_deg) >= config.min_sign_flips
    }
}

fn peak_to_peak(history: &VecDeque<Entry>) -> f64 {
    let (lo, hi) = history
        .iter()
        .map(|e| e.sample.angle_deg)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), a| (lo.min(a), hi.max(a)));
    hi - lo
}

/// Count direction reversals between deltas of at least `min_delta`.
fn sign_flips(history: &VecDeque<Entry>, min_delta: f64) -> usize {
    let mut flips = 0;
    let mut last_rising: Option<bool> = None;
    for (a, b) in history.iter().zip(history.iter().skip(1)) {
        let delta = b.sample.angle_deg - a.sample.angle_deg;
        if delta == 0.0 || delta.abs() < min_delta {
            continue;
        }
        let rising = delta > 0.0;
        if last_rising.is_some_and(|r| r != rising) {
            flips += 1;
        }
        last_rising = Some(rising);
    }
    flips
}
