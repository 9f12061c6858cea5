//! Velocity bands: the loud / fade / silent policy shared by both mappers.
//!
//! Slow movement is loud, fast movement is silent, and the range in
//! between fades along a configurable curve.

use crate::config::{BandConfig, FadeCurve};

/// Which band a speed falls in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    /// `speed <= full_below`
    Loud,
    /// Inside the fade range; carries the position in [0, 1].
    Fade(f64),
    /// `speed > silent_above`
    Silent,
}

impl FadeCurve {
    /// Level at fade position `t`: 1 at the loud edge, 0 at the silent edge.
    pub fn level(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Quadratic => (1.0 - t) * (1.0 - t),
            FadeCurve::Smoothstep => 1.0 - t * t * (3.0 - 2.0 * t),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VelocityBands {
    full_below: f64,
    silent_above: f64,
    curve: FadeCurve,
}

impl VelocityBands {
    pub fn new(config: &BandConfig) -> Self {
        VelocityBands {
            full_below: config.full_below_deg_s,
            silent_above: config.silent_above_deg_s,
            curve: config.curve,
        }
    }

    /// Classify a speed (the sign of the velocity is ignored).
    pub fn classify(&self, velocity: f64) -> Band {
        let speed = velocity.abs();
        if speed <= self.full_below {
            Band::Loud
        } else if speed <= self.silent_above {
            Band::Fade((speed - self.full_below) / (self.silent_above - self.full_below))
        } else {
            Band::Silent
        }
    }

    /// Loudness factor in [0, 1] for a velocity.
    pub fn level(&self, velocity: f64) -> f64 {
        match self.classify(velocity) {
            Band::Loud => 1.0,
            Band::Fade(t) => self.curve.level(t),
            Band::Silent => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [FadeCurve; 3] = [FadeCurve::Linear, FadeCurve::Quadratic, FadeCurve::Smoothstep];

    fn bands(curve: FadeCurve) -> VelocityBands {
        VelocityBands::new(&BandConfig {
            curve,
            ..BandConfig::default()
        })
    }

    #[test]
    fn documented_boundaries() {
        let b = bands(FadeCurve::Linear);
        assert_eq!(b.classify(0.0), Band::Loud);
        assert_eq!(b.classify(10.0), Band::Loud);
        assert_eq!(b.classify(-10.0), Band::Loud);
        assert_eq!(b.classify(55.0), Band::Fade(0.5));
        assert_eq!(b.classify(100.0), Band::Fade(1.0));
        assert_eq!(b.classify(100.5), Band::Silent);
        assert_eq!(b.classify(-250.0), Band::Silent);
    }

    #[test]
    fn fade_is_continuous_at_edges() {
        for curve in CURVES {
            let b = bands(curve);
            assert!((b.level(10.0 + 1e-9) - 1.0).abs() < 1e-6, "{curve:?} jumps at loud edge");
            assert!(b.level(100.0).abs() < 1e-12, "{curve:?} not silent at 100");
        }
    }

    #[test]
    fn fade_is_non_increasing() {
        for curve in CURVES {
            let b = bands(curve);
            let mut prev = b.level(10.0);
            for i in 0..=900 {
                let v = 10.0 + i as f64 * 0.1;
                let level = b.level(v);
                assert!(level <= prev + 1e-12, "{curve:?}: level rose at {v} ({prev} -> {level})");
                assert!((0.0..=1.0).contains(&level));
                prev = level;
            }
        }
    }

    #[test]
    fn sign_does_not_matter() {
        let b = bands(FadeCurve::Smoothstep);
        for v in [3.0, 25.0, 70.0, 150.0] {
            assert_eq!(b.level(v), b.level(-v));
        }
    }
}
