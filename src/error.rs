use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid root path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Search pattern rejected before a search starts.
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    /// Filesystem watcher setup errors.
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// The engine task is gone (channel closed).
    #[error("Engine unavailable: {0}")]
    Engine(String),
}
