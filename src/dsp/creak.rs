//! Creak mapping: velocity drives the gain and playback rate of a
//! looping door-creak sample.
//!
//! - Slow movement (up to 10 deg/s): full volume, natural pitch.
//! - Medium movement (10-100 deg/s): fades to silence, rate rises slightly.
//! - Fast movement (over 100 deg/s): silent, rate frozen.

use serde::{Deserialize, Serialize};

use crate::config::{CreakConfig, EngineConfig};
use crate::error::EngineError;
use crate::output::{AudioOutput, NullOutput};

use super::bands::{Band, VelocityBands};
use super::engine::{Engine, Motion, ParameterMapper};
use super::ramp::{Ramp, Rampable};

/// Published creak playback parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreakParams {
    /// Linear gain [0, 1].
    pub gain: f64,
    /// Playback rate (1.0 = natural pitch).
    pub rate: f64,
}

impl Rampable for CreakParams {
    fn ramp_toward(&self, target: &Self, ramp: &Ramp, dt: f64) -> Self {
        CreakParams {
            gain: ramp.step(self.gain, target.gain, dt),
            rate: ramp.step(self.rate, target.rate, dt),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreakMapper {
    config: CreakConfig,
    bands: VelocityBands,
}

impl CreakMapper {
    pub fn new(config: CreakConfig) -> Self {
        let config = config.sanitized();
        CreakMapper {
            bands: VelocityBands::new(&config.bands),
            config,
        }
    }
}

impl ParameterMapper for CreakMapper {
    type Params = CreakParams;

    const NAME: &'static str = "creak";

    fn rest(&self) -> CreakParams {
        CreakParams {
            gain: 0.0,
            rate: self.config.base_rate,
        }
    }

    fn targets(&self, motion: &Motion, previous: &CreakParams) -> CreakParams {
        let c = &self.config;
        let rate = match self.bands.classify(motion.velocity) {
            Band::Loud => Some(c.base_rate),
            Band::Fade(t) => Some(c.base_rate + c.rate_span * t),
            // Inaudible anyway; keep the pitch where it was.
            Band::Silent => None,
        };
        let rate = match rate {
            Some(r) if motion.velocity < 0.0 => r * (1.0 - c.closing_rate_bias),
            Some(r) => r,
            None => previous.rate,
        };

        let level = if motion.velocity.abs() < c.min_audible_velocity_deg_s {
            0.0
        } else {
            self.bands.level(motion.velocity)
        };

        CreakParams {
            gain: (c.max_gain * level).clamp(0.0, 1.0),
            rate: rate.clamp(c.min_rate, c.max_rate),
        }
    }

    fn silence(&self, params: &CreakParams) -> CreakParams {
        CreakParams {
            gain: 0.0,
            ..*params
        }
    }
}

pub type CreakEngine<O = NullOutput> = Engine<CreakMapper, O>;

impl<O: AudioOutput<CreakParams>> Engine<CreakMapper, O> {
    /// Build a stopped creak engine; fails if `output` cannot be opened.
    pub fn new(output: O, config: EngineConfig) -> Result<Self, EngineError> {
        let mapper = CreakMapper::new(config.creak.clone());
        Engine::with_mapper(mapper, output, config)
    }

    pub fn current_gain(&self) -> f64 {
        self.published().gain
    }

    pub fn current_rate(&self) -> f64 {
        self.published().rate
    }
}
