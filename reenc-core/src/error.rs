use thiserror::Error;

/// Custom error types for reenc
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("Invalid path: {0}")]
    Path(String),

    #[error("External process error: {0}")]
    Process(String),
}

/// Result type for reenc operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
