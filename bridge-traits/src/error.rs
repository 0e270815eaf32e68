use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),
}

impl BridgeError {
    /// Returns `true` when retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
