//! # Tape Image Testkit
//!
//! Test utilities for the tape image reader.
//!
//! This crate provides:
//! - A tape image writer that produces well-formed fixtures
//! - Corruption helpers that damage individual descriptor fields
//! - Property-based test generators using proptest
//! - A tracing layer that counts warnings, to observe recovery
//!
//! ## Usage
//!
//! ```rust
//! use tapeimage_testkit::prelude::*;
//!
//! let fixture = TapeWriter::new().record(b"hello").record(b" world").finish();
//! let mut tape = fixture.open();
//! let log = read_to_end(&mut tape, 4).unwrap();
//! assert_eq!(log.data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
}

pub use fixtures::*;
pub use generators::*;
pub use logging::*;
