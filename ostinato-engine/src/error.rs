//! Error types for the looper engine

use thiserror::Error;

/// Top-level engine error
#[derive(Debug, Error)]
pub enum EngineError {
    /// Buffer binding / geometry errors
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Control command errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors related to the shared sample buffer
#[derive(Debug, Error)]
pub enum BufferError {
    /// Zero frames or zero channels
    #[error("Buffer must have at least one frame and one channel")]
    ZeroLength,

    /// Unsupported channel count at construction
    #[error("Unsupported channel count {channels} (expected 1, 2 or 4)")]
    UnsupportedChannels { channels: usize },
}

/// Errors related to control message delivery
#[derive(Debug, Error)]
pub enum CommandError {
    /// SPSC ring is full; the command was dropped
    #[error("Command queue full, dropped {0:?} command")]
    QueueFull(&'static str),

    /// Command refused in the current transport state
    #[error("Command not allowed: {0}")]
    NotAllowed(&'static str),
}

/// Result type alias using the engine error type
pub type Result<T> = std::result::Result<T, EngineError>;
