pub mod clock;
pub mod config;
pub mod dsp;
pub mod error;
pub mod output;

pub use crate::config::{EngineConfig, FadeCurve, JitterConfig};
pub use crate::dsp::creak::{CreakEngine, CreakParams};
pub use crate::dsp::engine::{Engine, EngineSnapshot, EngineState, ParameterMapper};
pub use crate::dsp::futuristic::{FuturisticEngine, FuturisticParams};
pub use crate::dsp::jitter::AngleSample;
pub use crate::error::{ConfigError, EngineError, OutputError};
pub use crate::output::{AudioOutput, NullOutput, RecordingOutput};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the lidsound-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: the default engine configuration as pretty JSON.
#[wasm_bindgen]
pub fn default_config_json() -> Result<String, JsValue> {
    EngineConfig::default()
        .to_json()
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn parse_config(json: Option<String>) -> Result<EngineConfig, JsValue> {
    match json {
        Some(json) => {
            EngineConfig::from_json(&json).map_err(|e| JsValue::from_str(&format!("{e}")))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn parse_jitter(value: JsValue) -> Result<JitterConfig, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed creak engine. Timestamps come from the page
/// (`performance.now()`, in milliseconds).
#[wasm_bindgen]
pub struct WasmCreakEngine {
    inner: CreakEngine,
}

#[wasm_bindgen]
impl WasmCreakEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmCreakEngine, JsValue> {
        let config = parse_config(config_json)?;
        let inner =
            CreakEngine::new(NullOutput, config).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(WasmCreakEngine { inner })
    }

    pub fn start(&mut self) {
        self.inner.start_engine();
    }

    pub fn stop(&mut self) {
        self.inner.stop_engine();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.is_engine_running()
    }

    pub fn update(&mut self, angle_deg: f64, timestamp_ms: f64) {
        self.inner.update_with_lid_angle_at(angle_deg, timestamp_ms / 1000.0);
    }

    #[wasm_bindgen(js_name = setAngularVelocity)]
    pub fn set_angular_velocity(&mut self, velocity: f64) {
        self.inner.set_angular_velocity(velocity);
    }

    #[wasm_bindgen(js_name = resetJitterHistory)]
    pub fn reset_jitter_history(&mut self) {
        self.inner.reset_jitter_history();
    }

    #[wasm_bindgen(js_name = setJitterConfig)]
    pub fn set_jitter_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        self.inner.set_jitter_config(parse_jitter(config)?);
        Ok(())
    }

    pub fn gain(&self) -> f64 {
        self.inner.current_gain()
    }

    pub fn rate(&self) -> f64 {
        self.inner.current_rate()
    }

    pub fn velocity(&self) -> f64 {
        self.inner.current_velocity()
    }

    #[wasm_bindgen(js_name = stabilizedAngle)]
    pub fn stabilized_angle(&self) -> f64 {
        self.inner.current_stabilized_angle()
    }

    /// Full engine state as a plain JS object.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.snapshot())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }
}

/// WASM-exposed futuristic tone engine.
#[wasm_bindgen]
pub struct WasmFuturisticEngine {
    inner: FuturisticEngine,
}

#[wasm_bindgen]
impl WasmFuturisticEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmFuturisticEngine, JsValue> {
        let config = parse_config(config_json)?;
        let inner = FuturisticEngine::new(NullOutput, config)
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(WasmFuturisticEngine { inner })
    }

    pub fn start(&mut self) {
        self.inner.start_engine();
    }

    pub fn stop(&mut self) {
        self.inner.stop_engine();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.is_engine_running()
    }

    pub fn update(&mut self, angle_deg: f64, timestamp_ms: f64) {
        self.inner.update_with_lid_angle_at(angle_deg, timestamp_ms / 1000.0);
    }

    #[wasm_bindgen(js_name = setAngularVelocity)]
    pub fn set_angular_velocity(&mut self, velocity: f64) {
        self.inner.set_angular_velocity(velocity);
    }

    #[wasm_bindgen(js_name = resetJitterHistory)]
    pub fn reset_jitter_history(&mut self) {
        self.inner.reset_jitter_history();
    }

    #[wasm_bindgen(js_name = setJitterConfig)]
    pub fn set_jitter_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        self.inner.set_jitter_config(parse_jitter(config)?);
        Ok(())
    }

    pub fn frequency(&self) -> f64 {
        self.inner.current_frequency()
    }

    pub fn volume(&self) -> f64 {
        self.inner.current_volume()
    }

    #[wasm_bindgen(js_name = lfoRate)]
    pub fn lfo_rate(&self) -> f64 {
        self.inner.current_lfo_rate()
    }

    pub fn velocity(&self) -> f64 {
        self.inner.current_velocity()
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.snapshot())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }
}
