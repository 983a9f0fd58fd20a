//! Error types for the tape image reader.

use std::fmt;
use tapeimage_io::StreamError;
use thiserror::Error;

/// Result type for tape image operations.
pub type TapeResult<T> = Result<T, TapeError>;

/// Errors that can occur while reading a tape image.
///
/// Partial reads and end of stream are not errors; they are reported through
/// [`tapeimage_io::ReadStatus`]. A single patched anomaly is not an error
/// either; it shows up as [`tapeimage_io::ReadOutcome::tainted`].
#[derive(Debug, Error)]
pub enum TapeError {
    /// The underlying stream failed.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// The source ended where the framing promised more bytes.
    #[error("unexpected end of stream: {message}")]
    UnexpectedEof {
        /// Description of what was being read.
        message: String,
    },

    /// A second anomaly was found while already recovering from one.
    #[error("recovery failed: {message}")]
    FailedRecovery {
        /// Description of the anomaly.
        message: String,
    },

    /// The framing is broken beyond repair.
    #[error("file corrupt: {message}")]
    Corrupt {
        /// Description of the violation.
        message: String,
    },

    /// An offset inside the indexed range was not found in the index.
    #[error("seek: offset {offset} not found in index, last next = {last_next}")]
    IndexLookup {
        /// The logical offset looked up.
        offset: i64,
        /// `next` of the last indexed descriptor.
        last_next: u32,
    },

    /// Internal bookkeeping disagrees with the underlying stream.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the disagreement.
        message: String,
    },

    /// The caller passed an argument the format cannot honour.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the argument error.
        message: String,
    },

    /// The underlying stream was peeled off this tape image.
    #[error("underlying stream has been released")]
    Released,

    /// An earlier fatal error left the tape image in an unknown state.
    #[error("tape image is unusable after an earlier fatal error")]
    Poisoned,
}

impl TapeError {
    /// Create an unexpected end of stream error.
    pub fn unexpected_eof(message: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            message: message.into(),
        }
    }

    /// Create a failed recovery error.
    pub fn failed_recovery(message: impl Into<String>) -> Self {
        Self::FailedRecovery {
            message: message.into(),
        }
    }

    /// Create a corruption error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true if the tape image must not be used after this error.
    ///
    /// Misuse errors, and a source refusing to move, leave the tape image
    /// untouched.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::Released
                | Self::Poisoned
                | Self::Stream(StreamError::NotSeekable)
        )
    }
}

/// Error returned when a tape image cannot be opened.
///
/// The stream that was passed in is handed back, unused beyond the attempt to
/// read the first descriptor.
pub struct OpenError<S> {
    error: TapeError,
    stream: S,
}

impl<S> OpenError<S> {
    pub(crate) fn new(error: TapeError, stream: S) -> Self {
        Self { error, stream }
    }

    /// The reason opening failed.
    #[must_use]
    pub fn error(&self) -> &TapeError {
        &self.error
    }

    /// Takes back the stream.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Splits into the error and the stream.
    #[must_use]
    pub fn into_parts(self) -> (TapeError, S) {
        (self.error, self.stream)
    }
}

impl<S> fmt::Debug for OpenError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<S> fmt::Display for OpenError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot open tape image: {}", self.error)
    }
}

impl<S> std::error::Error for OpenError<S> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<S> From<OpenError<S>> for TapeError {
    fn from(err: OpenError<S>) -> Self {
        err.error
    }
}
