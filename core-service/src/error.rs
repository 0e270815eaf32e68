use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Player service is not started")]
    NotStarted,

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
