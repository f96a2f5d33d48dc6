use ubyte::{ByteUnit, ToByteUnit};

use super::errors::SizeLimitExceeded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// An upper limit on the size of the request bodies that will be decoded.
///
/// The limit is checked before the body is handed over to a codec, so oversized payloads
/// are rejected without being parsed.
pub enum BodySizeLimit {
    /// There is an active limit on the size of request bodies.
    Enabled {
        /// The maximum size of request bodies, in bytes.
        max_size: ByteUnit,
    },
    /// There is no limit on the size of request bodies.
    Disabled,
}

impl Default for BodySizeLimit {
    fn default() -> Self {
        Self::Enabled {
            max_size: 2.megabytes(),
        }
    }
}

impl BodySizeLimit {
    /// Check a body of `len` bytes against this limit.
    pub fn check(&self, len: usize) -> Result<(), SizeLimitExceeded> {
        match *self {
            BodySizeLimit::Enabled { max_size } if len > max_size => Err(SizeLimitExceeded {
                max_size,
                actual_size: len,
            }),
            _ => Ok(()),
        }
    }
}
