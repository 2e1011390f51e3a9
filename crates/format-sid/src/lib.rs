//! PSID/RSID tune files.
//!
//! A SID file is a big-endian header followed by a C64 memory image:
//!
//! | Offset | Size | Field                                          |
//! |--------|------|------------------------------------------------|
//! | $00    | 4    | magic, "PSID" or "RSID"                        |
//! | $04    | 2    | version (1-4, or $4E for the multi-SID layout) |
//! | $06    | 2    | data offset (header size)                      |
//! | $08    | 2    | load address, 0 = first two data bytes (LE)    |
//! | $0A    | 2    | init address                                   |
//! | $0C    | 2    | play address, 0 = tune installs an IRQ         |
//! | $0E    | 2    | number of subtunes                             |
//! | $10    | 2    | default subtune (1-based)                      |
//! | $12    | 4    | speed bits, one per subtune                    |
//! | $16    | 32   | title (Latin-1, NUL padded)                    |
//! | $36    | 32   | author                                         |
//! | $56    | 32   | released                                       |
//! | $76    | 2    | flags: clock, chip models                      |
//! | $78    | 1    | relocation start page                          |
//! | $79    | 1    | relocation page count                          |
//! | $7A    | 6    | extra chip addresses (and flags)               |
//!
//! Version 1 headers stop at $76.

mod chips;
mod error;
mod header;

pub use chips::{
    Channel, ChipSpec, PRIMARY_BASE, SidModel, chip_base, is_valid_base,
};
pub use error::FormatError;
pub use header::{
    Clock, HEADER_V1_SIZE, HEADER_V2_SIZE, HeaderLayout, MULTI_SID_VERSION, SidHeader, TuneFormat,
};

/// A parsed tune: header plus the memory image to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidTune {
    pub header: SidHeader,
    /// Where `payload` goes in C64 memory.
    pub load_address: u16,
    /// Memory image, without any load-address prefix.
    pub payload: Vec<u8>,
}

impl SidTune {
    /// Parse a complete SID file.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let header = SidHeader::parse(data)?;
        let mut payload = &data[usize::from(header.data_offset)..];

        let load_address = if header.load_address == 0 {
            let [low, high, rest @ ..] = payload else {
                return Err(FormatError::MissingLoadAddress);
            };
            payload = rest;
            u16::from_le_bytes([*low, *high])
        } else {
            header.load_address
        };

        if payload.is_empty() {
            return Err(FormatError::EmptyPayload);
        }

        Ok(Self {
            header,
            load_address,
            payload: payload.to_vec(),
        })
    }

    /// Encode back to a SID file. A zero header load address puts the
    /// address in front of the payload.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes();
        if self.header.load_address == 0 {
            out.extend_from_slice(&self.load_address.to_le_bytes());
        }
        out.extend_from_slice(&self.payload);
        out
    }

    /// One past the last loaded byte, capped at $FFFF.
    #[must_use]
    pub fn end_address(&self) -> u16 {
        let end = usize::from(self.load_address) + self.payload.len();
        u16::try_from(end).unwrap_or(0xFFFF)
    }

    /// Whether part of the image would fall beyond $FFFF.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        usize::from(self.load_address) + self.payload.len() > 0x1_0000
    }

    /// Init address. The PSID format defines a zero init address as
    /// "same as the load address".
    #[must_use]
    pub fn init_address(&self) -> u16 {
        if self.header.init_address == 0 {
            self.load_address
        } else {
            self.header.init_address
        }
    }
}
