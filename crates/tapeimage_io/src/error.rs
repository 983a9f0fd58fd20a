//! Error types for stream operations.

use std::io;
use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors that can occur during stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream cannot report or change its position.
    #[error("stream is not seekable")]
    NotSeekable,

    /// The stream is closed.
    #[error("stream is closed")]
    Closed,

    /// A stacked adapter failed to interpret the bytes of its source.
    #[error("protocol error: {0}")]
    Protocol(Box<dyn std::error::Error + Send + Sync>),
}

impl StreamError {
    /// Wraps an adapter error so it can travel through the [`crate::ByteStream`] interface.
    pub fn protocol(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Protocol(Box::new(err))
    }
}
