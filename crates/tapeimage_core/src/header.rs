//! On-disk record descriptor.

/// Size of a record descriptor in bytes.
pub const HEADER_SIZE: usize = 12;

/// Largest physical offset the format can represent.
pub const MAX_OFFSET: u64 = u32::MAX as u64;

/// Type tag of a record descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum HeaderType {
    /// An ordinary data record.
    Record = 0,
    /// A file mark. Two in a row end the tape.
    File = 1,
}

impl HeaderType {
    /// Converts a raw tag to a header type.
    #[must_use]
    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Record),
            1 => Some(Self::File),
            _ => None,
        }
    }

    /// Converts the header type to its raw tag.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

/// A record descriptor: `(type, prev, next)`, little-endian on disk.
///
/// The type is kept raw so a descriptor with an unknown tag can be decoded
/// and then judged by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Raw type tag.
    pub kind: u32,
    /// Physical offset of the preceding descriptor.
    pub prev: u32,
    /// Physical offset of the following descriptor.
    pub next: u32,
}

impl Header {
    /// Creates a header with a known type.
    #[must_use]
    pub const fn new(kind: HeaderType, prev: u32, next: u32) -> Self {
        Self {
            kind: kind.as_u32(),
            prev,
            next,
        }
    }

    /// Returns the header type, or `None` for an unknown tag.
    #[must_use]
    pub const fn header_type(&self) -> Option<HeaderType> {
        HeaderType::from_u32(self.kind)
    }

    /// Returns true for a file mark.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.kind == HeaderType::File as u32
    }

    /// Decodes a descriptor from its on-disk bytes.
    #[must_use]
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        let field =
            |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            kind: field(0),
            prev: field(4),
            next: field(8),
        }
    }

    /// Encodes the descriptor to its on-disk bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.kind.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.prev.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.next.to_le_bytes());
        bytes
    }
}
