//! Audio output boundary: the handle an engine pushes published
//! parameters into.
//!
//! Sample loading, device access and looping playback live behind this
//! trait in the host. Each engine owns exactly one output for its whole
//! lifetime; there is no process-wide audio session.

use serde::Serialize;

use crate::error::{ConfigError, OutputError};

/// A playback backend driven by an engine's published parameters.
pub trait AudioOutput<P> {
    /// Acquire devices and load samples. Called once, at engine construction.
    fn open(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    /// Begin playback (engine entered Running).
    fn start(&mut self) {}

    /// Halt playback (engine entered Stopped).
    fn stop(&mut self) {}

    /// Receive the latest published parameters.
    fn apply(&mut self, params: &P);
}

/// Output that accepts everything and plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutput;

impl<P> AudioOutput<P> for NullOutput {
    fn apply(&mut self, _params: &P) {}
}

/// Output that keeps every applied parameter frame, for traces and tests.
#[derive(Debug, Clone)]
pub struct RecordingOutput<P> {
    frames: Vec<P>,
    playing: bool,
    starts: usize,
    stops: usize,
}

impl<P> RecordingOutput<P> {
    pub fn new() -> Self {
        RecordingOutput {
            frames: Vec::new(),
            playing: false,
            starts: 0,
            stops: 0,
        }
    }

    pub fn frames(&self) -> &[P] {
        &self.frames
    }

    pub fn last(&self) -> Option<&P> {
        self.frames.last()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Number of `start` / `stop` calls received.
    pub fn transitions(&self) -> (usize, usize) {
        (self.starts, self.stops)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl<P: Serialize> RecordingOutput<P> {
    /// Dump the recorded frames as a JSON array.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(&self.frames)?)
    }
}

impl<P> Default for RecordingOutput<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone> AudioOutput<P> for RecordingOutput<P> {
    fn start(&mut self) {
        self.playing = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.stops += 1;
    }

    fn apply(&mut self, params: &P) {
        self.frames.push(params.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_frames_in_order() {
        let mut out: RecordingOutput<f64> = RecordingOutput::new();
        out.apply(&1.0_f64);
        out.apply(&0.5_f64);
        assert_eq!(out.frames(), &[1.0, 0.5]);
        assert_eq!(out.last(), Some(&0.5));
        assert_eq!(out.to_json().unwrap(), "[1.0,0.5]");
    }

    #[test]
    fn recording_tracks_transport() {
        let mut out: RecordingOutput<f64> = RecordingOutput::new();
        assert!(out.open().is_ok());
        out.start();
        assert!(out.is_playing());
        out.stop();
        assert!(!out.is_playing());
        assert_eq!(out.transitions(), (1, 1));
    }
}
