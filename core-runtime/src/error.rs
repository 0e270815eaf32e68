//! Runtime error type shared by configuration, wiring and logging setup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host collaborator was not supplied to the builder.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The tracing subscriber could not be built or installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl Error {
    /// Name of the missing collaborator trait, if this is a wiring error.
    pub fn missing_capability(&self) -> Option<&str> {
        match self {
            Error::CapabilityMissing { capability, .. } => Some(capability),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
