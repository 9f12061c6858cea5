//! Engine: drives the shared filtering chain and publishes ramped
//! audio parameters.
//!
//! ```text
//! raw angle → JitterFilter → stabilized angle → VelocityEstimator
//!           → ParameterMapper (creak | futuristic) → targets
//!           → Ramp → published parameters → AudioOutput
//! ```
//!
//! The engine is driven from one thread by a periodic sensor callback.
//! Every operation is bounded by the jitter window and never blocks.

use std::fmt::Debug;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::clock::{Clock, MonotonicClock};
use crate::config::{EngineConfig, JitterConfig};
use crate::error::EngineError;
use crate::output::AudioOutput;

use super::jitter::{AngleSample, JitterFilter};
use super::ramp::{Ramp, Rampable};
use super::velocity::VelocityEstimator;

/// What a mapper gets to see on each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Stabilized lid angle (deg).
    pub angle_deg: f64,
    /// Filtered signed angular velocity (deg/s).
    pub velocity: f64,
}

/// Strategy turning motion into audio parameter targets.
pub trait ParameterMapper {
    type Params: Rampable + Debug + PartialEq + Serialize;

    /// Short name used in log lines.
    const NAME: &'static str;

    /// Safe parameters for a freshly started engine.
    fn rest(&self) -> Self::Params;

    /// Targets for the current motion. `previous` is the last target,
    /// for parameters that hold their value in some bands.
    fn targets(&self, motion: &Motion, previous: &Self::Params) -> Self::Params;

    /// `params` with every loudness control forced to zero.
    fn silence(&self, params: &Self::Params) -> Self::Params;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Stopped,
    Running,
}

/// Filtering state, readable by observers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineState {
    pub stabilized_angle: f64,
    pub last_angle: Option<f64>,
    pub last_timestamp: Option<f64>,
    pub raw_velocity: f64,
    pub current_velocity: f64,
}

/// Everything an observer may want in one serializable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineSnapshot<P> {
    pub run_state: RunState,
    pub state: EngineState,
    pub published: P,
    pub target: P,
}

pub struct Engine<M: ParameterMapper, O> {
    mapper: M,
    output: O,
    clock: Box<dyn Clock + Send>,
    config: EngineConfig,
    ramp: Ramp,
    jitter: JitterFilter,
    velocity: VelocityEstimator,
    run_state: RunState,
    stabilized_angle: f64,
    last_raw: Option<AngleSample>,
    last_tick_s: Option<f64>,
    target: M::Params,
    published: M::Params,
}

impl<M: ParameterMapper, O: AudioOutput<M::Params>> Engine<M, O> {
    /// Build a stopped engine around `mapper`, opening `output`.
    ///
    /// Fails only when the output cannot be opened.
    pub fn with_mapper(
        mapper: M,
        mut output: O,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if let Err(e) = output.open() {
            error!("{} engine: audio output failed to open: {e}", M::NAME);
            return Err(e.into());
        }

        let config = config.sanitized();
        let rest = mapper.rest();
        debug!("{} engine ready", M::NAME);
        Ok(Engine {
            ramp: Ramp::new(&config.ramp),
            mapper,
            output,
            clock: Box::new(MonotonicClock::new()),
            config,
            jitter: JitterFilter::new(),
            velocity: VelocityEstimator::new(),
            run_state: RunState::Stopped,
            stabilized_angle: 0.0,
            last_raw: None,
            last_tick_s: None,
            target: rest,
            published: rest,
        })
    }

    /// Replace the time source used by [`Engine::update_with_lid_angle`].
    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // ── Lifecycle ───────────────────────────────────────────

    /// Stopped → Running. Resets all state to safe defaults.
    pub fn start_engine(&mut self) {
        if self.run_state == RunState::Running {
            return;
        }
        self.reset_state();
        self.run_state = RunState::Running;
        self.output.start();
        self.output.apply(&self.published);
        info!("{} engine started", M::NAME);
    }

    /// Running → Stopped. Output is silenced at once, without ramping.
    pub fn stop_engine(&mut self) {
        if self.run_state == RunState::Stopped {
            return;
        }
        self.published = self.mapper.silence(&self.published);
        self.target = self.published;
        self.output.apply(&self.published);
        self.output.stop();
        self.jitter.reset();
        self.run_state = RunState::Stopped;
        info!("{} engine stopped", M::NAME);
    }

    pub fn is_engine_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    fn reset_state(&mut self) {
        self.jitter.clear();
        self.velocity.reset();
        self.stabilized_angle = 0.0;
        self.last_raw = None;
        self.last_tick_s = None;
        self.target = self.mapper.rest();
        self.published = self.target;
    }

    // ── Updates ─────────────────────────────────────────────

    /// Feed a sensor reading stamped with the engine clock.
    pub fn update_with_lid_angle(&mut self, angle_deg: f64) {
        if !self.is_engine_running() {
            return;
        }
        let now = self.clock.now_seconds();
        self.update_with_lid_angle_at(angle_deg, now);
    }

    /// Feed a sensor reading with an explicit timestamp (seconds).
    ///
    /// Ignored while stopped, and for non-finite or out-of-range input.
    pub fn update_with_lid_angle_at(&mut self, angle_deg: f64, timestamp_s: f64) {
        if !self.is_engine_running() {
            return;
        }
        if !self.config.accepts_angle(angle_deg) || !timestamp_s.is_finite() {
            debug!("{} engine: ignoring sample {angle_deg} deg at {timestamp_s} s", M::NAME);
            return;
        }

        let raw = AngleSample::new(angle_deg, timestamp_s);
        self.last_raw = Some(raw);
        self.stabilized_angle = self.jitter.process(raw, &self.config.jitter);
        self.velocity
            .update(AngleSample::new(self.stabilized_angle, timestamp_s), &self.config.velocity);

        let dt = self.last_tick_s.map_or(0.0, |last| timestamp_s - last);
        self.last_tick_s = Some(timestamp_s);
        self.retarget(dt);
    }

    /// Inject a velocity directly, bypassing estimation, and advance the
    /// ramp by one nominal tick.
    pub fn set_angular_velocity(&mut self, velocity: f64) {
        if !self.is_engine_running() {
            return;
        }
        self.velocity.set(velocity, &self.config.velocity);
        self.retarget(self.config.ramp.nominal_tick_s);
    }

    fn retarget(&mut self, dt: f64) {
        let motion = Motion {
            angle_deg: self.stabilized_angle,
            velocity: self.velocity.current(),
        };
        self.target = self.mapper.targets(&motion, &self.target);
        self.published = self.published.ramp_toward(&self.target, &self.ramp, dt);
        self.output.apply(&self.published);
    }

    // ── Jitter tuning ───────────────────────────────────────

    pub fn reset_jitter_history(&mut self) {
        self.jitter.reset();
    }

    pub fn jitter_config(&self) -> &JitterConfig {
        &self.config.jitter
    }

    pub fn set_jitter_config(&mut self, config: JitterConfig) {
        if config.enabled != self.config.jitter.enabled {
            self.jitter.reset();
        }
        self.config.jitter = config.sanitized();
    }

    /// Toggling the filter also clears its history.
    pub fn set_jitter_filter_enabled(&mut self, enabled: bool) {
        self.set_jitter_config(JitterConfig {
            enabled,
            ..self.config.jitter.clone()
        });
    }

    pub fn set_jitter_amplitude_deg(&mut self, amplitude_deg: f64) {
        self.set_jitter_config(JitterConfig {
            amplitude_deg,
            ..self.config.jitter.clone()
        });
    }

    pub fn set_jitter_time_window_ms(&mut self, time_window_ms: f64) {
        self.set_jitter_config(JitterConfig {
            time_window_ms,
            ..self.config.jitter.clone()
        });
    }

    pub fn set_jitter_min_delta_deg(&mut self, min_delta_deg: f64) {
        self.set_jitter_config(JitterConfig {
            min_delta_deg,
            ..self.config.jitter.clone()
        });
    }

    pub fn set_jitter_min_sign_flips(&mut self, min_sign_flips: usize) {
        self.set_jitter_config(JitterConfig {
            min_sign_flips,
            ..self.config.jitter.clone()
        });
    }

    // ── Observables ─────────────────────────────────────────

    pub fn current_velocity(&self) -> f64 {
        self.velocity.current()
    }

    pub fn raw_velocity(&self) -> f64 {
        self.velocity.raw()
    }

    pub fn current_stabilized_angle(&self) -> f64 {
        self.stabilized_angle
    }

    pub fn published(&self) -> &M::Params {
        &self.published
    }

    pub fn target(&self) -> &M::Params {
        &self.target
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            stabilized_angle: self.stabilized_angle,
            last_angle: self.last_raw.map(|s| s.angle_deg),
            last_timestamp: self.last_raw.map(|s| s.timestamp_s),
            raw_velocity: self.velocity.raw(),
            current_velocity: self.velocity.current(),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot<M::Params> {
        EngineSnapshot {
            run_state: self.run_state,
            state: self.state(),
            published: self.published,
            target: self.target,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }
}
