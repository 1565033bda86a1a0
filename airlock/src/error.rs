use thiserror::Error;

/// Errors that can occur while loading or running the airlock daemon.
#[derive(Error, Debug)]
pub enum AirlockError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

pub type Result<T> = std::result::Result<T, AirlockError>;
