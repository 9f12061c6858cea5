use std::fmt;

/// Failure reported by an audio-output backend while it initializes.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputError {
    /// No output device or audio session could be obtained.
    Unavailable,
    /// A sample file could not be loaded or decoded.
    SampleLoad { path: String, reason: String },
    /// The device opened but refused the requested format.
    Device { reason: String },
}

#[derive(Debug)]
pub enum EngineError {
    Output(OutputError),
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Unavailable => write!(f, "No audio output available"),
            OutputError::SampleLoad { path, reason } => {
                write!(f, "Failed to load sample '{path}': {reason}")
            }
            OutputError::Device { reason } => write!(f, "Audio device error: {reason}"),
        }
    }
}

impl std::error::Error for OutputError {}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Output(e) => write!(f, "Engine initialization failed: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Output(e) => Some(e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "Invalid engine config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
        }
    }
}

impl From<OutputError> for EngineError {
    fn from(e: OutputError) -> Self {
        EngineError::Output(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}
