//! # Tape Image I/O
//!
//! Byte stream trait and stream sources for the tape image adapter.
//!
//! This crate provides the lowest-level stream abstraction. Streams are
//! **opaque byte sources** - they do not interpret the data they carry.
//! The tape image adapter in `tapeimage_core` consumes a [`ByteStream`] and
//! is itself a [`ByteStream`], so adapters can be stacked.
//!
//! ## Design Principles
//!
//! - Streams are simple positioned byte sources (read, seek, tell, close)
//! - Partial reads are reported with a status, not an error
//! - No knowledge of tape image headers or any other framing
//! - Must be `Send` so a stream can be handed to another thread
//!
//! ## Available Streams
//!
//! - [`InMemoryStream`] - For testing, including blocked-source simulation
//! - [`FileStream`] - For reading files through OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use tapeimage_io::{ByteStream, InMemoryStream, ReadStatus};
//!
//! let mut stream = InMemoryStream::new(b"hello world".to_vec());
//! let mut buf = [0u8; 5];
//! let outcome = stream.read(&mut buf).unwrap();
//! assert_eq!(outcome.len, 5);
//! assert_eq!(outcome.status, ReadStatus::Ok);
//! assert_eq!(&buf, b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod stream;

pub use error::{StreamError, StreamResult};
pub use file::FileStream;
pub use memory::InMemoryStream;
pub use stream::{ByteStream, ReadOutcome, ReadStatus};
