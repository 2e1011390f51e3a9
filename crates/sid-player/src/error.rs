//! Player error types.

use format_sid::FormatError;
use thiserror::Error;

/// A chip layout or player setting that cannot be used as given.
///
/// These are recovered from: the player logs a warning and falls back to a
/// working default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chips {first} and {second} overlap at ${base:04X}")]
    Overlap {
        first: usize,
        second: usize,
        base: u16,
    },
    #[error("chip {index} base ${base:04X} is not a SID address")]
    InvalidBase { index: usize, base: u16 },
    #[error("no SID socket is enabled")]
    InvalidChipCount,
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("no tune loaded")]
    NoTune,
    #[error("subtune {subtune} init did not return within {budget} instructions")]
    InitTimeout { subtune: u16, budget: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("configuration file: {0}")]
    Json(#[from] serde_json::Error),
}
