//! Ownership of the underlying stream.

use crate::error::{TapeError, TapeResult};

/// The underlying stream, unless it has been handed back to the caller.
#[derive(Debug)]
pub(crate) enum Handle<S> {
    Owned(S),
    Released,
}

impl<S> Handle<S> {
    pub(crate) fn get(&self) -> TapeResult<&S> {
        match self {
            Self::Owned(stream) => Ok(stream),
            Self::Released => Err(TapeError::Released),
        }
    }

    pub(crate) fn get_mut(&mut self) -> TapeResult<&mut S> {
        match self {
            Self::Owned(stream) => Ok(stream),
            Self::Released => Err(TapeError::Released),
        }
    }

    /// Moves the stream out, leaving [`Handle::Released`] behind.
    pub(crate) fn take(&mut self) -> TapeResult<S> {
        match std::mem::replace(self, Self::Released) {
            Self::Owned(stream) => Ok(stream),
            Self::Released => Err(TapeError::Released),
        }
    }

    pub(crate) fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}
