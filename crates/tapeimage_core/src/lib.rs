//! # Tape Image Core
//!
//! Random-access reader that hides tape image (TIF) record headers.
//!
//! A tape image interleaves a 12-byte descriptor in front of every record:
//!
//! ```text
//! | type | prev | next | payload ... | type | prev | next | payload ... |
//! ```
//!
//! All three fields are little-endian `u32`. `next` is the physical offset of
//! the following descriptor, `prev` the physical offset of the preceding one.
//! A tape ends with two consecutive `FILE` descriptors.
//!
//! [`TapeImage`] wraps any [`ByteStream`] and presents the payload bytes as
//! one contiguous logical stream, with `read`, `seek` and `tell` working on
//! logical offsets. Descriptors are indexed lazily as the stream is
//! traversed, and a single damaged descriptor is patched in memory so the
//! rest of the tape stays readable.
//!
//! ## Example
//!
//! ```rust
//! use tapeimage_core::{Header, HeaderType, TapeImage, HEADER_SIZE};
//! use tapeimage_io::{InMemoryStream, ReadStatus};
//!
//! // One record with "hello", followed by the FILE/FILE sentinel.
//! let mut bytes = Vec::new();
//! bytes.extend(Header::new(HeaderType::Record, 0, 17).encode());
//! bytes.extend(b"hello");
//! bytes.extend(Header::new(HeaderType::File, 0, 29).encode());
//! bytes.extend(Header::new(HeaderType::File, 17, 41).encode());
//! assert_eq!(bytes.len(), 5 + 3 * HEADER_SIZE);
//!
//! let mut tape = TapeImage::open(InMemoryStream::new(bytes)).unwrap();
//! let mut buf = [0u8; 16];
//! let outcome = tape.read(&mut buf).unwrap();
//! assert_eq!(&buf[..outcome.len], b"hello");
//! assert_eq!(outcome.status, ReadStatus::Eof);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod address;
mod config;
mod cursor;
mod error;
mod handle;
mod header;
mod index;
mod recovery;
mod tape;

pub use address::AddressMap;
pub use config::Config;
pub use cursor::Cursor;
pub use error::{OpenError, TapeError, TapeResult};
pub use header::{Header, HeaderType, HEADER_SIZE, MAX_OFFSET};
pub use index::{Lookup, RecordIndex};
pub use recovery::RecoveryState;
pub use tape::TapeImage;

pub use tapeimage_io::{ByteStream, ReadOutcome, ReadStatus};
