//! Versioned wire header prefixed to every payload buffer.
//!
//! Layout (3 bytes, followed by `remaining` extension bytes):
//!
//! | offset | size | meaning                                  |
//! |--------|------|------------------------------------------|
//! | 0      | 1    | payload format tag ([`PAYLOAD_TYPE`])    |
//! | 1      | 1    | wire format version                      |
//! | 2      | 1    | number of extension bytes after the base |
use crate::error::{PayloadError, PayloadResult};

/// Payload format identifier stored in the first byte of every buffer.
pub const PAYLOAD_TYPE: u8 = b'H';

/// Newest wire format version this engine reads and writes.
pub const WIRE_FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    payload_type: u8,
    version: u8,
    remaining: u8,
}

impl WireHeader {
    /// Size of the fixed part of the header.
    pub const BASE_SIZE: usize = 3;

    /// Header written by `clear` and by freshly created payloads.
    pub const fn current() -> Self {
        Self {
            payload_type: PAYLOAD_TYPE,
            version: WIRE_FORMAT_VERSION,
            remaining: 0,
        }
    }

    /// Total header size, including extension bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        Self::BASE_SIZE + self.remaining as usize
    }

    #[inline]
    pub const fn payload_type(&self) -> u8 {
        self.payload_type
    }

    #[inline]
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Number of extension bytes following the base header.
    #[inline]
    pub const fn remaining(&self) -> u8 {
        self.remaining
    }

    /// Decode a header from the start of `bytes`.
    ///
    /// Older versions are accepted verbatim; a version newer than
    /// [`WIRE_FORMAT_VERSION`] is rejected.
    pub fn decode(bytes: &[u8]) -> PayloadResult<Self> {
        let &[payload_type, version, remaining, ..] = bytes else {
            return Err(PayloadError::Truncated {
                offset: 0,
                needed: Self::BASE_SIZE,
                available: bytes.len(),
            });
        };

        if version > WIRE_FORMAT_VERSION {
            return Err(PayloadError::UnsupportedVersion {
                found: version,
                supported: WIRE_FORMAT_VERSION,
            });
        }

        let header = Self {
            payload_type,
            version,
            remaining,
        };

        if bytes.len() < header.size() {
            return Err(PayloadError::Truncated {
                offset: Self::BASE_SIZE,
                needed: remaining as usize,
                available: bytes.len() - Self::BASE_SIZE,
            });
        }

        Ok(header)
    }

    /// Write the base header into `dst`. Extension bytes are not touched.
    pub fn encode_into(&self, dst: &mut [u8]) {
        dst[0] = self.payload_type;
        dst[1] = self.version;
        dst[2] = self.remaining;
    }
}

impl Default for WireHeader {
    fn default() -> Self {
        Self::current()
    }
}
