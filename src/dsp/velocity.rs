//! Angular velocity estimation from the stabilized angle stream.
//!
//! Multi-stage: finite difference, deadzone, glitch clamp, then a
//! time-constant low-pass so the estimate does not depend on how often
//! the sensor reports.

use crate::config::VelocityConfig;

use super::jitter::AngleSample;
use super::ramp::coefficient;

#[derive(Debug, Clone, Default)]
pub struct VelocityEstimator {
    last: Option<AngleSample>,
    /// Unfiltered finite difference of the last two samples (deg/s).
    raw: f64,
    /// Filtered, authoritative velocity (deg/s).
    current: f64,
}

impl VelocityEstimator {
    pub fn new() -> Self {
        VelocityEstimator {
            last: None,
            raw: 0.0,
            current: 0.0,
        }
    }

    /// Feed the next stabilized sample and return the filtered velocity.
    pub fn update(&mut self, sample: AngleSample, config: &VelocityConfig) -> f64 {
        let Some(last) = self.last.replace(sample) else {
            self.raw = 0.0;
            return self.current;
        };

        let elapsed = sample.timestamp_s - last.timestamp_s;
        self.raw = (sample.angle_deg - last.angle_deg) / elapsed.max(config.min_elapsed_s);

        let limited = clamp_rate(deadzone(self.raw, config.deadzone_deg_s), config.max_rate_deg_s);
        let k = coefficient(elapsed.max(0.0), config.smoothing_time_s);
        let smoothed = self.current + k * (limited - self.current);
        self.current = clamp_rate(deadzone(smoothed, config.deadzone_deg_s), config.max_rate_deg_s);
        self.current
    }

    /// Override the filtered velocity. Non-finite values are ignored.
    pub fn set(&mut self, velocity: f64, config: &VelocityConfig) {
        if velocity.is_finite() {
            self.raw = velocity;
            self.current = clamp_rate(velocity, config.max_rate_deg_s);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn raw(&self) -> f64 {
        self.raw
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// The last stabilized sample seen, if any.
    pub fn last_sample(&self) -> Option<AngleSample> {
        self.last
    }
}

fn deadzone(velocity: f64, threshold: f64) -> f64 {
    if velocity.abs() < threshold { 0.0 } else { velocity }
}

fn clamp_rate(velocity: f64, max_rate: f64) -> f64 {
    velocity.clamp(-max_rate, max_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(
        est: &mut VelocityEstimator,
        config: &VelocityConfig,
        angles: impl Iterator<Item = (f64, f64)>,
    ) -> f64 {
        let mut v = 0.0;
        for (angle, t) in angles {
            v = est.update(AngleSample::new(angle, t), config);
        }
        v
    }

    #[test]
    fn first_sample_has_no_velocity() {
        let mut est = VelocityEstimator::new();
        let v = est.update(AngleSample::new(90.0, 5.0), &VelocityConfig::default());
        assert_eq!(v, 0.0);
        assert_eq!(est.raw(), 0.0);
    }

    #[test]
    fn steady_motion_converges() {
        let mut est = VelocityEstimator::new();
        let config = VelocityConfig::default();
        // 1 degree every 20 ms = 50 deg/s
        let v = feed(&mut est, &config, (0..50).map(|i| (i as f64, i as f64 * 0.02)));
        assert!((v - 50.0).abs() < 0.5, "Should converge to 50 deg/s, got {v}");
        assert!((est.raw() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn closing_motion_is_negative() {
        let mut est = VelocityEstimator::new();
        let config = VelocityConfig::default();
        let v = feed(&mut est, &config, (0..50).map(|i| (100.0 - i as f64, i as f64 * 0.02)));
        assert!((v + 50.0).abs() < 0.5, "Should converge to -50 deg/s, got {v}");
    }

    #[test]
    fn slow_drift_snaps_to_zero() {
        let mut est = VelocityEstimator::new();
        let config = VelocityConfig::default();
        // 0.5 deg/s is inside the 1 deg/s deadzone
        let drift = (0..100).map(|i| (45.0 + 0.01 * i as f64, i as f64 * 0.02));
        let v = feed(&mut est, &config, drift);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn stopping_settles_exactly_at_zero() {
        let mut est = VelocityEstimator::new();
        let config = VelocityConfig::default();
        feed(&mut est, &config, (0..20).map(|i| (i as f64 * 2.0, i as f64 * 0.02)));
        assert!(est.current() > 0.0);
        let v = feed(&mut est, &config, (20..80).map(|i| (38.0, i as f64 * 0.02)));
        assert_eq!(v, 0.0, "Velocity should settle to exactly zero");
    }

    #[test]
    fn duplicate_timestamps_stay_finite() {
        let mut est = VelocityEstimator::new();
        let config = VelocityConfig::default();
        est.update(AngleSample::new(10.0, 1.0), &config);
        let v = est.update(AngleSample::new(11.0, 1.0), &config);
        assert!(v.is_finite());
        assert!(v.abs() <= config.max_rate_deg_s);
    }

    #[test]
    fn glitch_is_clamped() {
        let mut est = VelocityEstimator::new();
        let config = VelocityConfig {
            smoothing_time_s: 0.0,
            ..VelocityConfig::default()
        };
        est.update(AngleSample::new(0.0, 0.0), &config);
        let v = est.update(AngleSample::new(120.0, 0.01), &config);
        assert_eq!(v, config.max_rate_deg_s);
        assert!(est.raw() > config.max_rate_deg_s);
    }

    #[test]
    fn override_sets_authoritative_value() {
        let mut est = VelocityEstimator::new();
        let config = VelocityConfig::default();
        est.set(-150.0, &config);
        assert_eq!(est.current(), -150.0);
        est.set(f64::NAN, &config);
        assert_eq!(est.current(), -150.0);
        est.set(1e9, &config);
        assert_eq!(est.current(), config.max_rate_deg_s);
    }

    #[test]
    fn reset_forgets_history() {
        let mut est = VelocityEstimator::new();
        let config = VelocityConfig::default();
        feed(&mut est, &config, (0..10).map(|i| (i as f64, i as f64 * 0.02)));
        est.reset();
        assert_eq!(est.current(), 0.0);
        assert!(est.last_sample().is_none());
    }
}
