use thiserror::Error;

/// Problems detected while defining shader programs or building scene groups.
///
/// All of these are fatal at startup: a scene whose table fails to resolve is
/// never handed to the frame loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown geometry kind '{0}'")]
    UnknownGeometry(String),
    #[error("unknown shader variant '{0}'")]
    UnknownShader(String),
    #[error("unknown scene preset '{0}'")]
    UnknownPreset(String),
    #[error("shader '{shader}' has no uniform slot '{uniform}'")]
    UnknownUniform { shader: String, uniform: String },
    #[error("uniform '{uniform}' on shader '{shader}' expects a {expected} value")]
    UniformType {
        shader: String,
        uniform: String,
        expected: &'static str,
    },
    #[error("shader '{0}' does not declare a 'time' uniform")]
    MissingTimeUniform(String),
    #[error("shader '{0}' is already defined")]
    DuplicateProgram(String),
    #[error("shader '{shader}' declares uniform '{uniform}' twice")]
    DuplicateUniform { shader: String, uniform: String },
    #[error("shader program name must not be empty")]
    EmptyProgramName,
    #[error("registry is full ({0} programs)")]
    TooManyPrograms(usize),
    #[error("invalid analyser config: {0}")]
    InvalidAnalyser(String),
    #[error("invalid reactive params: {0}")]
    InvalidReactive(String),
}

/// Failures reported by the host's audio input capability.
///
/// None of these ever reach the frame loop as an error; the audio-reactive
/// subsystem turns them into a transition to `Disabled`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("microphone access denied: {0}")]
    Denied(String),
    #[error("no usable input device: {0}")]
    Unavailable(String),
    #[error("input stream ended")]
    Disconnected,
}
