//! Engine configuration: every tunable constant of the signal chain.
//!
//! All structs deserialize from partial JSON (missing fields take their
//! defaults). Values are never rejected: [`EngineConfig::sanitized`]
//! replaces unusable ones with defaults and logs what it changed.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Lowest cutoff the tone filter may be driven to (Hz).
pub const MIN_AUDIBLE_HZ: f64 = 20.0;
/// Highest cutoff the tone filter may be driven to (Hz).
pub const MAX_AUDIBLE_HZ: f64 = 20_000.0;
/// Longest jitter window accepted (ms); keeps the sample history bounded.
pub const MAX_JITTER_WINDOW_MS: f64 = 5_000.0;

// ── Jitter ──────────────────────────────────────────────────

/// Live-tunable sensor chatter suppression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    pub enabled: bool,
    /// Peak-to-peak amplitude at or below which oscillation counts as
    /// jitter (deg).
    pub amplitude_deg: f64,
    /// Length of the sliding history window (ms).
    pub time_window_ms: f64,
    /// Smallest delta that takes part in sign-flip counting (deg).
    pub min_delta_deg: f64,
    /// Direction reversals required inside the window.
    pub min_sign_flips: usize,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            amplitude_deg: 1.5,
            time_window_ms: 300.0,
            min_delta_deg: 0.2,
            min_sign_flips: 3,
        }
    }
}

impl JitterConfig {
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            enabled: self.enabled,
            amplitude_deg: fix(
                "jitter.amplitude_deg",
                self.amplitude_deg,
                d.amplitude_deg,
                |v| v >= 0.0,
            ),
            time_window_ms: fix(
                "jitter.time_window_ms",
                self.time_window_ms,
                d.time_window_ms,
                |v| v > 0.0 && v <= MAX_JITTER_WINDOW_MS,
            ),
            min_delta_deg: fix(
                "jitter.min_delta_deg",
                self.min_delta_deg,
                d.min_delta_deg,
                |v| v >= 0.0,
            ),
            min_sign_flips: self.min_sign_flips,
        }
    }
}

// ── Velocity ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Speeds below this snap to zero (deg/s).
    pub deadzone_deg_s: f64,
    /// Magnitude ceiling; faster readings are treated as glitches and
    /// clamped (deg/s).
    pub max_rate_deg_s: f64,
    /// Floor on the elapsed time between samples (s).
    pub min_elapsed_s: f64,
    /// Time constant of the velocity low-pass stage (s). Zero disables it.
    pub smoothing_time_s: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            deadzone_deg_s: 1.0,
            max_rate_deg_s: 1000.0,
            min_elapsed_s: 0.001,
            smoothing_time_s: 0.03,
        }
    }
}

impl VelocityConfig {
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let deadzone_deg_s = fix(
            "velocity.deadzone_deg_s",
            self.deadzone_deg_s,
            d.deadzone_deg_s,
            |v| v >= 0.0,
        );
        Self {
            deadzone_deg_s,
            max_rate_deg_s: fix(
                "velocity.max_rate_deg_s",
                self.max_rate_deg_s,
                d.max_rate_deg_s.max(deadzone_deg_s),
                |v| v > deadzone_deg_s,
            ),
            min_elapsed_s: fix(
                "velocity.min_elapsed_s",
                self.min_elapsed_s,
                d.min_elapsed_s,
                |v| v > 0.0,
            ),
            smoothing_time_s: fix(
                "velocity.smoothing_time_s",
                self.smoothing_time_s,
                d.smoothing_time_s,
                |v| v >= 0.0,
            ),
        }
    }
}

// ── Ramp ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    /// Exponential time constant (s). Five of these settle a transition.
    pub time_constant_s: f64,
    /// Distance from the target below which a parameter snaps onto it.
    pub settle_epsilon: f64,
    /// Tick length assumed when a velocity is injected directly (s).
    pub nominal_tick_s: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            time_constant_s: 0.025,
            settle_epsilon: 1e-6,
            nominal_tick_s: 0.016,
        }
    }
}

impl RampConfig {
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            time_constant_s: fix(
                "ramp.time_constant_s",
                self.time_constant_s,
                d.time_constant_s,
                |v| v >= 0.0,
            ),
            settle_epsilon: fix(
                "ramp.settle_epsilon",
                self.settle_epsilon,
                d.settle_epsilon,
                |v| v >= 0.0,
            ),
            nominal_tick_s: fix(
                "ramp.nominal_tick_s",
                self.nominal_tick_s,
                d.nominal_tick_s,
                |v| v > 0.0,
            ),
        }
    }
}

// ── Velocity bands ──────────────────────────────────────────

/// Shape of the fade between the loud and silent bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeCurve {
    #[default]
    Linear,
    /// Falls off quickly just above the loud band.
    Quadratic,
    /// Flat at both ends, steepest in the middle.
    Smoothstep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Upper edge of the loud band (deg/s).
    pub full_below_deg_s: f64,
    /// Lower edge of the silent band (deg/s).
    pub silent_above_deg_s: f64,
    pub curve: FadeCurve,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            full_below_deg_s: 10.0,
            silent_above_deg_s: 100.0,
            curve: FadeCurve::Linear,
        }
    }
}

impl BandConfig {
    pub fn sanitized(self, section: &str) -> Self {
        let d = Self::default();
        let ordered = self.full_below_deg_s.is_finite()
            && self.silent_above_deg_s.is_finite()
            && self.full_below_deg_s >= 0.0
            && self.silent_above_deg_s > self.full_below_deg_s;
        if ordered {
            self
        } else {
            warn!(
                "{section}.bands: [{}, {}] is not an ascending range, using defaults",
                self.full_below_deg_s, self.silent_above_deg_s
            );
            Self { curve: self.curve, ..d }
        }
    }
}

// ── Creak ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreakConfig {
    pub bands: BandConfig,
    /// Gain in the loud band, [0, 1].
    pub max_gain: f64,
    /// Speeds below this are silent (deg/s). Zero keeps the whole loud
    /// band audible.
    pub min_audible_velocity_deg_s: f64,
    /// Playback rate in the loud band (1.0 = natural pitch).
    pub base_rate: f64,
    /// Extra rate added at the top of the fade band.
    pub rate_span: f64,
    /// Fractional rate reduction while the lid is closing, [0, 1).
    pub closing_rate_bias: f64,
    pub min_rate: f64,
    pub max_rate: f64,
}

impl Default for CreakConfig {
    fn default() -> Self {
        Self {
            bands: BandConfig::default(),
            max_gain: 1.0,
            min_audible_velocity_deg_s: 0.0,
            base_rate: 1.0,
            rate_span: 0.2,
            closing_rate_bias: 0.0,
            min_rate: 0.5,
            max_rate: 2.0,
        }
    }
}

impl CreakConfig {
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let min_rate = fix("creak.min_rate", self.min_rate, d.min_rate, |v| v > 0.0);
        let max_rate = fix(
            "creak.max_rate",
            self.max_rate,
            d.max_rate.max(min_rate),
            |v| v >= min_rate,
        );
        Self {
            bands: self.bands.sanitized("creak"),
            max_gain: fix("creak.max_gain", self.max_gain, d.max_gain, |v| {
                (0.0..=1.0).contains(&v)
            }),
            min_audible_velocity_deg_s: fix(
                "creak.min_audible_velocity_deg_s",
                self.min_audible_velocity_deg_s,
                d.min_audible_velocity_deg_s,
                |v| v >= 0.0,
            ),
            base_rate: fix("creak.base_rate", self.base_rate, d.base_rate, |v| v > 0.0)
                .clamp(min_rate, max_rate),
            rate_span: fix("creak.rate_span", self.rate_span, d.rate_span, |_| true),
            closing_rate_bias: fix(
                "creak.closing_rate_bias",
                self.closing_rate_bias,
                d.closing_rate_bias,
                |v| (0.0..1.0).contains(&v),
            ),
            min_rate,
            max_rate,
        }
    }
}

// ── Futuristic ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuturisticConfig {
    pub bands: BandConfig,
    pub max_volume: f64,
    /// Volume floor reached in the silent band.
    pub min_volume: f64,
    /// Lid angle mapped to the lowest cutoff (deg).
    pub closed_angle_deg: f64,
    /// Lid angle mapped to the highest cutoff (deg).
    pub open_angle_deg: f64,
    pub min_cutoff_hz: f64,
    pub max_cutoff_hz: f64,
    /// LFO rate at rest (Hz).
    pub lfo_base_hz: f64,
    /// LFO rate added at `lfo_velocity_ceiling_deg_s` (Hz).
    pub lfo_span_hz: f64,
    pub lfo_velocity_ceiling_deg_s: f64,
}

impl Default for FuturisticConfig {
    fn default() -> Self {
        Self {
            bands: BandConfig::default(),
            max_volume: 0.8,
            min_volume: 0.0,
            closed_angle_deg: 0.0,
            open_angle_deg: 135.0,
            min_cutoff_hz: 200.0,
            max_cutoff_hz: 8000.0,
            lfo_base_hz: 0.5,
            lfo_span_hz: 3.0,
            lfo_velocity_ceiling_deg_s: 200.0,
        }
    }
}

impl FuturisticConfig {
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        let max_volume = fix("futuristic.max_volume", self.max_volume, d.max_volume, unit);
        let min_volume = fix(
            "futuristic.min_volume",
            self.min_volume,
            d.min_volume.min(max_volume),
            |v| unit(v) && v <= max_volume,
        );

        let angles_ok = self.closed_angle_deg.is_finite()
            && self.open_angle_deg.is_finite()
            && self.open_angle_deg > self.closed_angle_deg;
        let (closed_angle_deg, open_angle_deg) = if angles_ok {
            (self.closed_angle_deg, self.open_angle_deg)
        } else {
            warn!(
                "futuristic: angle range [{}, {}] is not ascending, using defaults",
                self.closed_angle_deg, self.open_angle_deg
            );
            (d.closed_angle_deg, d.open_angle_deg)
        };

        let min_cutoff_hz = fix(
            "futuristic.min_cutoff_hz",
            self.min_cutoff_hz,
            d.min_cutoff_hz,
            |v| (MIN_AUDIBLE_HZ..MAX_AUDIBLE_HZ).contains(&v),
        );
        let max_cutoff_hz = fix(
            "futuristic.max_cutoff_hz",
            self.max_cutoff_hz,
            MAX_AUDIBLE_HZ.min(d.max_cutoff_hz.max(min_cutoff_hz * 2.0)),
            |v| v > min_cutoff_hz && v <= MAX_AUDIBLE_HZ,
        );

        Self {
            bands: self.bands.sanitized("futuristic"),
            max_volume,
            min_volume,
            closed_angle_deg,
            open_angle_deg,
            min_cutoff_hz,
            max_cutoff_hz,
            lfo_base_hz: fix(
                "futuristic.lfo_base_hz",
                self.lfo_base_hz,
                d.lfo_base_hz,
                |v| v >= 0.0,
            ),
            lfo_span_hz: fix(
                "futuristic.lfo_span_hz",
                self.lfo_span_hz,
                d.lfo_span_hz,
                |v| v >= 0.0,
            ),
            lfo_velocity_ceiling_deg_s: fix(
                "futuristic.lfo_velocity_ceiling_deg_s",
                self.lfo_velocity_ceiling_deg_s,
                d.lfo_velocity_ceiling_deg_s,
                |v| v > 0.0,
            ),
        }
    }
}

// ── Engine ──────────────────────────────────────────────────

/// Complete configuration shared by both engines. Each engine reads the
/// mapper section that applies to it and ignores the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub jitter: JitterConfig,
    pub velocity: VelocityConfig,
    pub ramp: RampConfig,
    pub creak: CreakConfig,
    pub futuristic: FuturisticConfig,
    /// Sensor readings outside `[valid_angle_min_deg, valid_angle_max_deg]`
    /// are ignored.
    pub valid_angle_min_deg: f64,
    pub valid_angle_max_deg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            jitter: JitterConfig::default(),
            velocity: VelocityConfig::default(),
            ramp: RampConfig::default(),
            creak: CreakConfig::default(),
            futuristic: FuturisticConfig::default(),
            valid_angle_min_deg: 0.0,
            valid_angle_max_deg: 360.0,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace every unusable value with its default.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let range_ok = self.valid_angle_min_deg.is_finite()
            && self.valid_angle_max_deg.is_finite()
            && self.valid_angle_max_deg > self.valid_angle_min_deg;
        let (valid_angle_min_deg, valid_angle_max_deg) = if range_ok {
            (self.valid_angle_min_deg, self.valid_angle_max_deg)
        } else {
            warn!(
                "valid angle range [{}, {}] is not ascending, using defaults",
                self.valid_angle_min_deg, self.valid_angle_max_deg
            );
            (d.valid_angle_min_deg, d.valid_angle_max_deg)
        };

        Self {
            jitter: self.jitter.sanitized(),
            velocity: self.velocity.sanitized(),
            ramp: self.ramp.sanitized(),
            creak: self.creak.sanitized(),
            futuristic: self.futuristic.sanitized(),
            valid_angle_min_deg,
            valid_angle_max_deg,
        }
    }

    pub fn accepts_angle(&self, angle_deg: f64) -> bool {
        angle_deg.is_finite()
            && (self.valid_angle_min_deg..=self.valid_angle_max_deg).contains(&angle_deg)
    }
}

/// Keep `value` if it is finite and passes `valid`, otherwise fall back.
fn fix(name: &str, value: f64, fallback: f64, valid: impl Fn(f64) -> bool) -> f64 {
    if value.is_finite() && valid(value) {
        value
    } else {
        warn!("{name} = {value} is out of range, using {fallback}");
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_sanitizing() {
        let config = EngineConfig::default();
        assert_eq!(config.clone().sanitized(), config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{ "jitter": { "amplitude_deg": 2.5 } }"#).unwrap();
        assert_eq!(config.jitter.amplitude_deg, 2.5);
        assert_eq!(config.jitter.time_window_ms, 300.0);
        assert_eq!(config.creak, CreakConfig::default());
    }

    #[test]
    fn fade_curve_parses_lowercase() {
        let json = r#"{ "creak": { "bands": { "curve": "smoothstep" } } }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.creak.bands.curve, FadeCurve::Smoothstep);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(format!("{err}").starts_with("Invalid engine config"));
    }

    #[test]
    fn json_round_trip_preserves_values() {
        let mut config = EngineConfig::default();
        config.velocity.deadzone_deg_s = 2.0;
        config.futuristic.bands.curve = FadeCurve::Quadratic;
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn sanitizing_replaces_unusable_values() {
        let mut config = EngineConfig::default();
        config.jitter.time_window_ms = -5.0;
        config.velocity.min_elapsed_s = 0.0;
        config.ramp.time_constant_s = f64::NAN;
        config.creak.max_gain = 3.0;
        config.creak.bands.silent_above_deg_s = 5.0;
        config.futuristic.open_angle_deg = -1.0;
        config.valid_angle_max_deg = f64::INFINITY;

        let fixed = config.sanitized();
        let d = EngineConfig::default();
        assert_eq!(fixed.jitter.time_window_ms, d.jitter.time_window_ms);
        assert_eq!(fixed.velocity.min_elapsed_s, d.velocity.min_elapsed_s);
        assert_eq!(fixed.ramp.time_constant_s, d.ramp.time_constant_s);
        assert_eq!(fixed.creak.max_gain, d.creak.max_gain);
        assert_eq!(fixed.creak.bands, d.creak.bands);
        assert_eq!(fixed.futuristic.open_angle_deg, d.futuristic.open_angle_deg);
        assert_eq!(fixed.valid_angle_max_deg, d.valid_angle_max_deg);
    }

    #[test]
    fn jitter_window_is_capped() {
        let config = JitterConfig {
            time_window_ms: 1e12,
            ..JitterConfig::default()
        };
        let fixed = config.sanitized();
        assert_eq!(fixed.time_window_ms, JitterConfig::default().time_window_ms);

        let config = JitterConfig {
            time_window_ms: MAX_JITTER_WINDOW_MS,
            ..JitterConfig::default()
        };
        assert_eq!(config.sanitized().time_window_ms, MAX_JITTER_WINDOW_MS);
    }

    #[test]
    fn cutoff_range_stays_audible() {
        let mut config = FuturisticConfig::default();
        config.min_cutoff_hz = 5.0;
        config.max_cutoff_hz = 50_000.0;
        let fixed = config.sanitized();
        assert!(fixed.min_cutoff_hz >= MIN_AUDIBLE_HZ);
        assert!(fixed.max_cutoff_hz <= MAX_AUDIBLE_HZ);
        assert!(fixed.max_cutoff_hz > fixed.min_cutoff_hz);
    }

    #[test]
    fn angle_acceptance() {
        let config = EngineConfig::default();
        assert!(config.accepts_angle(0.0));
        assert!(config.accepts_angle(120.0));
        assert!(!config.accepts_angle(-3.0));
        assert!(!config.accepts_angle(f64::NAN));
        assert!(!config.accepts_angle(f64::INFINITY));
    }
}
