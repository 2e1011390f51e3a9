//! Tune file errors.

use thiserror::Error;

/// Why a tune file could not be read.
///
/// All of these are fatal to loading that one file only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("file too short for a SID header ({len} bytes)")]
    TooShort { len: usize },

    #[error("unrecognised magic {0:?}, expected \"PSID\" or \"RSID\"")]
    BadMagic([u8; 4]),

    #[error("data offset ${0:04X} is smaller than the smallest header")]
    BadDataOffset(u16),

    #[error("data offset ${offset:04X} lies beyond the end of the {len}-byte file")]
    HeaderOutOfBounds { offset: u16, len: usize },

    #[error("load address is zero but the payload has no address prefix")]
    MissingLoadAddress,

    #[error("no tune data after the header")]
    EmptyPayload,
}
