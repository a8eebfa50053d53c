//! Error types for the fallible edges of the crate.
//!
//! Everything on the musical path clamps instead of failing. The only errors
//! are opening the audio output and reading a configuration file.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host has no default output device.
    #[error("no audio output device available")]
    NoDevice,

    /// No output device matched the requested name.
    #[error("output device not found: {0}")]
    DeviceNotFound(String),

    /// The device only offers a sample format the engine does not render.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Building or starting the output stream failed.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for `EngineConfig`.
    #[cfg(feature = "config")]
    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    /// The configuration parsed but holds a value the engine cannot run with.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
