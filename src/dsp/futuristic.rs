//! Futuristic mapping: lid angle sweeps the filter cutoff of a
//! synthesized tone, movement speed sets its volume and LFO rate.
//!
//! The cutoff follows the angle exponentially, so equal angle steps give
//! equal musical intervals. Volume uses the same loud/fade/silent bands
//! as the creak. The LFO only adds texture: its rate creeps up with speed
//! and never jumps.

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, FuturisticConfig};
use crate::error::EngineError;
use crate::output::{AudioOutput, NullOutput};

use super::bands::VelocityBands;
use super::engine::{Engine, Motion, ParameterMapper};
use super::ramp::{Ramp, Rampable};

/// Published tone parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuturisticParams {
    /// Filter cutoff (Hz).
    pub frequency: f64,
    /// Linear volume [0, 1].
    pub volume: f64,
    /// Modulation LFO rate (Hz).
    pub lfo_rate: f64,
}

impl Rampable for FuturisticParams {
    fn ramp_toward(&self, target: &Self, ramp: &Ramp, dt: f64) -> Self {
        FuturisticParams {
            frequency: ramp.step(self.frequency, target.frequency, dt),
            volume: ramp.step(self.volume, target.volume, dt),
            lfo_rate: ramp.step(self.lfo_rate, target.lfo_rate, dt),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FuturisticMapper {
    config: FuturisticConfig,
    bands: VelocityBands,
}

impl FuturisticMapper {
    pub fn new(config: FuturisticConfig) -> Self {
        let config = config.sanitized();
        FuturisticMapper {
            bands: VelocityBands::new(&config.bands),
            config,
        }
    }

    /// Cutoff for a lid angle; angles beyond the range pin to its ends.
    pub fn cutoff_for_angle(&self, angle_deg: f64) -> f64 {
        let c = &self.config;
        let span = c.open_angle_deg - c.closed_angle_deg;
        let t = ((angle_deg - c.closed_angle_deg) / span).clamp(0.0, 1.0);
        c.min_cutoff_hz * (c.max_cutoff_hz / c.min_cutoff_hz).powf(t)
    }

    pub fn volume_for_velocity(&self, velocity: f64) -> f64 {
        let c = &self.config;
        c.min_volume + (c.max_volume - c.min_volume) * self.bands.level(velocity)
    }

    pub fn lfo_rate_for_velocity(&self, velocity: f64) -> f64 {
        let c = &self.config;
        c.lfo_base_hz + c.lfo_span_hz * (velocity.abs() / c.lfo_velocity_ceiling_deg_s).min(1.0)
    }
}

impl ParameterMapper for FuturisticMapper {
    type Params = FuturisticParams;

    const NAME: &'static str = "futuristic";

    fn rest(&self) -> FuturisticParams {
        FuturisticParams {
            frequency: self.config.min_cutoff_hz,
            volume: 0.0,
            lfo_rate: self.config.lfo_base_hz,
        }
    }

    fn targets(&self, motion: &Motion, _previous: &FuturisticParams) -> FuturisticParams {
        FuturisticParams {
            frequency: self.cutoff_for_angle(motion.angle_deg),
            volume: self.volume_for_velocity(motion.velocity),
            lfo_rate: self.lfo_rate_for_velocity(motion.velocity),
        }
    }

    fn silence(&self, params: &FuturisticParams) -> FuturisticParams {
        FuturisticParams {
            volume: 0.0,
            ..*params
        }
    }
}

pub type FuturisticEngine<O = NullOutput> = Engine<FuturisticMapper, O>;

impl<O: AudioOutput<FuturisticParams>> Engine<FuturisticMapper, O> {
    /// Build a stopped tone engine; fails if `output` cannot be opened.
    pub fn new(output: O, config: EngineConfig) -> Result<Self, EngineError> {
        let mapper = FuturisticMapper::new(config.futuristic.clone());
        Engine::with_mapper(mapper, output, config)
    }

    pub fn current_frequency(&self) -> f64 {
        self.published().frequency
    }

    pub fn current_volume(&self) -> f64 {
        self.published().volume
    }

    pub fn current_lfo_rate(&self) -> f64 {
        self.published().lfo_rate
    }
}
