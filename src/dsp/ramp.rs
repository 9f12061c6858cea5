//! Exponential parameter ramping.
//!
//! Every published parameter approaches its target with
//! `current += k * (target - current)`, where `k = 1 - exp(-dt / tau)`
//! is derived from the real time elapsed since the previous tick, so the
//! glide takes the same wall time whatever the update rate.

use crate::config::RampConfig;

/// One-pole smoothing coefficient for a step of `dt` seconds.
///
/// A zero time constant means "jump straight to the target".
#[inline]
pub fn coefficient(dt: f64, time_constant: f64) -> f64 {
    if time_constant <= 0.0 {
        1.0
    } else {
        1.0 - (-dt / time_constant).exp()
    }
}

#[derive(Debug, Clone)]
pub struct Ramp {
    time_constant: f64,
    settle_epsilon: f64,
}

impl Ramp {
    pub fn new(config: &RampConfig) -> Self {
        Ramp {
            time_constant: config.time_constant_s,
            settle_epsilon: config.settle_epsilon,
        }
    }

    /// Move `current` toward `target` by one tick of `dt` seconds.
    ///
    /// Once within the settle epsilon the value lands exactly on the
    /// target and stays there.
    pub fn step(&self, current: f64, target: f64, dt: f64) -> f64 {
        let next = current + coefficient(dt.max(0.0), self.time_constant) * (target - current);
        if (target - next).abs() <= self.settle_epsilon {
            target
        } else {
            next
        }
    }
}

/// A bundle of published parameters that can glide as a whole.
pub trait Rampable: Copy {
    fn ramp_toward(&self, target: &Self, ramp: &Ramp, dt: f64) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Ramp {
        Ramp::new(&RampConfig::default())
    }

    #[test]
    fn settles_within_150ms() {
        let r = ramp();
        let mut value = 0.0;
        let mut elapsed = 0.0;
        while value != 1.0 {
            value = r.step(value, 1.0, 0.001);
            elapsed += 0.001;
            assert!(elapsed < 1.0, "Ramp never settled");
        }
        // The audible part of the glide is over well before the snap.
        let mut v = 0.0;
        for _ in 0..150 {
            v = r.step(v, 1.0, 0.001);
        }
        assert!((v - 1.0).abs() < 0.01, "Should be within 1% after 150 ms, got {v}");
    }

    #[test]
    fn cadence_independent() {
        let r = ramp();
        let mut fine = 0.0;
        for _ in 0..50 {
            fine = r.step(fine, 1.0, 0.001);
        }
        let mut coarse = 0.0;
        for _ in 0..5 {
            coarse = r.step(coarse, 1.0, 0.01);
        }
        assert!((fine - coarse).abs() < 1e-9, "fine={fine} coarse={coarse}");
    }

    #[test]
    fn reaches_63_percent_at_one_time_constant() {
        let r = ramp();
        let v = r.step(0.0, 1.0, RampConfig::default().time_constant_s);
        assert!((v - 0.632).abs() < 0.001, "v={v}");
    }

    #[test]
    fn holds_once_settled() {
        let r = ramp();
        let mut v = 0.3;
        for _ in 0..1000 {
            v = r.step(v, 0.7, 0.016);
        }
        assert_eq!(v, 0.7);
        assert_eq!(r.step(v, 0.7, 0.016), 0.7);
    }

    #[test]
    fn never_overshoots() {
        let r = ramp();
        let mut v = 1.0;
        for _ in 0..200 {
            let next = r.step(v, 0.0, 0.05);
            assert!(next <= v && next >= 0.0, "Overshoot: {v} -> {next}");
            v = next;
        }
    }

    #[test]
    fn zero_dt_does_not_move() {
        let r = ramp();
        assert_eq!(r.step(0.25, 1.0, 0.0), 0.25);
        assert_eq!(r.step(0.25, 1.0, -1.0), 0.25);
    }

    #[test]
    fn zero_time_constant_jumps() {
        let r = Ramp::new(&RampConfig {
            time_constant_s: 0.0,
            ..RampConfig::default()
        });
        assert_eq!(r.step(0.0, 0.8, 0.001), 0.8);
    }
}
