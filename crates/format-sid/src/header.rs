//! Header layout, parsing and encoding.

use crate::FormatError;

/// Smallest header: version 1.
pub const HEADER_V1_SIZE: u16 = 0x76;
/// Header with flags, relocation info and extra chip addresses.
pub const HEADER_V2_SIZE: u16 = 0x7C;
/// Version number that selects the multi-SID layout.
pub const MULTI_SID_VERSION: u16 = 0x4E;

const EXTRA_OFFSET: usize = 0x7A;
const EXTRA_LEN: usize = 6;

/// Which playback environment a tune expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuneFormat {
    /// "PSID": init and play are called from a simulated frame loop.
    Psid,
    /// "RSID": the tune sets up its own interrupts on a real machine.
    Rsid,
}

impl TuneFormat {
    #[must_use]
    pub const fn magic(self) -> [u8; 4] {
        match self {
            TuneFormat::Psid => *b"PSID",
            TuneFormat::Rsid => *b"RSID",
        }
    }
}

/// How the bytes after the relocation fields describe extra chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Versions 1-4: up to two extra chips, models in the flags word.
    Classic,
    /// Version $4E: up to three extra chips, each with its own flag byte.
    MultiSid,
}

/// Video standard the tune was written for (flags bits 2-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    Unknown,
    Pal,
    Ntsc,
    Any,
}

impl Clock {
    /// Only tunes that ask for NTSC alone run on NTSC timing.
    #[must_use]
    pub const fn is_ntsc(self) -> bool {
        matches!(self, Clock::Ntsc)
    }
}

/// Decoded SID file header.
///
/// Multi-byte fields are big-endian in the file. `load_address` is the
/// header value, which may be zero; see [`crate::SidTune::load_address`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidHeader {
    pub format: TuneFormat,
    pub version: u16,
    pub data_offset: u16,
    pub load_address: u16,
    pub init_address: u16,
    pub play_address: u16,
    pub songs: u16,
    pub start_song: u16,
    /// Bit n-1 set: subtune n is timed by CIA 1 timer A, not the raster.
    pub speed: u32,
    pub title: String,
    pub author: String,
    pub released: String,
    /// High byte at $76, low byte at $77.
    pub flags: u16,
    pub start_page: u8,
    pub page_length: u8,
    /// Bytes $7A-$7F: extra chip addresses, and in the multi-SID layout
    /// their flag bytes.
    pub extra: [u8; EXTRA_LEN],
}

impl SidHeader {
    /// A version 2 header with one subtune and empty strings.
    #[must_use]
    pub fn new(format: TuneFormat) -> Self {
        Self {
            format,
            version: 2,
            data_offset: HEADER_V2_SIZE,
            load_address: 0,
            init_address: 0,
            play_address: 0,
            songs: 1,
            start_song: 1,
            speed: 0,
            title: String::new(),
            author: String::new(),
            released: String::new(),
            flags: 0,
            start_page: 0,
            page_length: 0,
            extra: [0; EXTRA_LEN],
        }
    }

    pub(crate) fn parse(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < usize::from(HEADER_V1_SIZE) {
            return Err(FormatError::TooShort { len: data.len() });
        }
        let magic = [data[0], data[1], data[2], data[3]];
        let format = match &magic {
            b"PSID" => TuneFormat::Psid,
            b"RSID" => TuneFormat::Rsid,
            _ => return Err(FormatError::BadMagic(magic)),
        };

        let word = |offset: usize| u16::from_be_bytes([data[offset], data[offset + 1]]);
        let data_offset = word(0x06);
        if data_offset < HEADER_V1_SIZE {
            return Err(FormatError::BadDataOffset(data_offset));
        }
        if usize::from(data_offset) > data.len() {
            return Err(FormatError::HeaderOutOfBounds {
                offset: data_offset,
                len: data.len(),
            });
        }
        let header = &data[..usize::from(data_offset)];
        let byte_at = |offset: usize| header.get(offset).copied().unwrap_or(0);

        let mut extra = [0; EXTRA_LEN];
        for (i, slot) in extra.iter_mut().enumerate() {
            *slot = byte_at(EXTRA_OFFSET + i);
        }

        Ok(Self {
            format,
            version: word(0x04),
            data_offset,
            load_address: word(0x08),
            init_address: word(0x0A),
            play_address: word(0x0C),
            songs: word(0x0E),
            start_song: word(0x10),
            speed: u32::from_be_bytes([data[0x12], data[0x13], data[0x14], data[0x15]]),
            title: latin1(&data[0x16..0x36]),
            author: latin1(&data[0x36..0x56]),
            released: latin1(&data[0x56..0x76]),
            flags: u16::from_be_bytes([byte_at(0x76), byte_at(0x77)]),
            start_page: byte_at(0x78),
            page_length: byte_at(0x79),
            extra,
        })
    }

    /// Encode to exactly `data_offset` bytes. Fields that do not fit in a
    /// short header are dropped.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(usize::from(self.data_offset.max(HEADER_V1_SIZE)));
        out.extend_from_slice(&self.format.magic());
        for word in [
            self.version,
            self.data_offset.max(HEADER_V1_SIZE),
            self.load_address,
            self.init_address,
            self.play_address,
            self.songs,
            self.start_song,
        ] {
            out.extend_from_slice(&word.to_be_bytes());
        }
        out.extend_from_slice(&self.speed.to_be_bytes());
        for text in [&self.title, &self.author, &self.released] {
            out.extend_from_slice(&encode_latin1(text));
        }
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.push(self.start_page);
        out.push(self.page_length);
        out.extend_from_slice(&self.extra);
        out.resize(usize::from(self.data_offset.max(HEADER_V1_SIZE)), 0);
        out
    }

    #[must_use]
    pub fn layout(&self) -> HeaderLayout {
        if self.version == MULTI_SID_VERSION {
            HeaderLayout::MultiSid
        } else {
            HeaderLayout::Classic
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        match (self.flags >> 2) & 0x03 {
            1 => Clock::Pal,
            2 => Clock::Ntsc,
            3 => Clock::Any,
            _ => Clock::Unknown,
        }
    }

    /// PSID tunes with flags bit 1 play samples through the volume register
    /// and need the player to support digi playback.
    #[must_use]
    pub fn needs_digi(&self) -> bool {
        self.format == TuneFormat::Psid && self.flags & 0x02 != 0
    }

    /// Number of subtunes, at least one.
    #[must_use]
    pub fn subtune_count(&self) -> u16 {
        self.songs.max(1)
    }

    /// Whether subtune `n` (1-based) is timed by CIA 1 timer A.
    ///
    /// Subtunes above 32 share bit 31.
    #[must_use]
    pub fn uses_cia_timer(&self, subtune: u16) -> bool {
        let bit = subtune.clamp(1, 32) - 1;
        self.speed & (1 << bit) != 0
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

fn encode_latin1(text: &str) -> [u8; 32] {
    let mut out = [0; 32];
    for (slot, ch) in out.iter_mut().zip(text.chars()) {
        *slot = u8::try_from(u32::from(ch)).unwrap_or(b'?');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_stop_at_nul_and_map_latin1() {
        let mut field = [0u8; 32];
        field[..4].copy_from_slice(&[b'A', 0xE9, b'B', 0]);
        field[5] = b'X';
        assert_eq!(latin1(&field), "A\u{e9}B");
        assert_eq!(&encode_latin1("A\u{e9}B")[..4], &[b'A', 0xE9, b'B', 0]);
        assert_eq!(encode_latin1("\u{263A}")[0], b'?');
    }

    #[test]
    fn speed_bits_follow_subtune_number() {
        let mut header = SidHeader::new(TuneFormat::Psid);
        header.speed = 0b101;
        assert!(header.uses_cia_timer(1));
        assert!(!header.uses_cia_timer(2));
        assert!(header.uses_cia_timer(3));
        header.speed = 0x8000_0000;
        assert!(header.uses_cia_timer(32));
        assert!(header.uses_cia_timer(200));
        assert!(!header.uses_cia_timer(31));
    }

    #[test]
    fn clock_from_flags() {
        let mut header = SidHeader::new(TuneFormat::Psid);
        assert_eq!(header.clock(), Clock::Unknown);
        header.flags = 0x08;
        assert!(header.clock().is_ntsc());
        header.flags = 0x0C;
        assert_eq!(header.clock(), Clock::Any);
        assert!(!header.clock().is_ntsc());
    }

    #[test]
    fn digi_flag_only_applies_to_psid() {
        let mut header = SidHeader::new(TuneFormat::Psid);
        header.flags = 0x02;
        assert!(header.needs_digi());
        header.format = TuneFormat::Rsid;
        assert!(!header.needs_digi());
    }

    #[test]
    fn short_header_encodes_to_v1_size() {
        let mut header = SidHeader::new(TuneFormat::Psid);
        header.version = 1;
        header.data_offset = HEADER_V1_SIZE;
        header.flags = 0xFFFF;
        assert_eq!(header.to_bytes().len(), 0x76);
    }
}
