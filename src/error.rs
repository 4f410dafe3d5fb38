//! Error types shared across the crate.

use thiserror::Error;

/// Errors raised while starting or running vibescope subsystems
#[derive(Error, Debug)]
pub enum Error {
    /// Audio device or stream failure
    #[error("Audio error: {0}")]
    Audio(String),

    /// Glicol rejected a generated patch
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// GPU setup failure (adapter, device, surface)
    #[error("GPU error: {0}")]
    Gpu(String),

    /// Shader failed validation
    #[error("Shader '{name}' failed to compile: {message}")]
    Shader { name: String, message: String },

    /// Invalid parameter value in configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Input listener failure (OSC socket, console)
    #[error("Input error: {0}")]
    Input(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for vibescope operations
pub type Result<T> = std::result::Result<T, Error>;
