//! Sound chip layout declared by a tune.
//!
//! The first chip always sits at $D400. Up to three more are declared in the
//! header, each by an address byte `b` meaning `$D000 + 16 * b`. An address
//! is usable only inside the SID area $D400-$D7FF or the expansion area
//! $DE00-$DFE0; anything else leaves that chip disabled.

use serde::{Deserialize, Serialize};

use crate::{HeaderLayout, SidHeader};

/// Base address of the first chip.
pub const PRIMARY_BASE: u16 = 0xD400;

/// SID chip revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SidModel {
    #[default]
    #[serde(rename = "6581")]
    Mos6581,
    #[serde(rename = "8580")]
    Mos8580,
}

impl SidModel {
    /// Decode a two-bit model field: 1 is 6581, 2 or 3 is 8580, 0 means
    /// "unspecified" and takes `fallback`.
    #[must_use]
    pub const fn from_bits(bits: u8, fallback: SidModel) -> SidModel {
        match bits & 0x03 {
            0 => fallback,
            1 => SidModel::Mos6581,
            _ => SidModel::Mos8580,
        }
    }
}

/// Stereo output a chip is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Left,
    Right,
    #[default]
    Both,
}

impl Channel {
    /// Decode multi-SID flag bits: bit 7 both, else bit 6 right, else left.
    #[must_use]
    pub const fn from_flags(flags: u8) -> Channel {
        if flags & 0x80 != 0 {
            Channel::Both
        } else if flags & 0x40 != 0 {
            Channel::Right
        } else {
            Channel::Left
        }
    }
}

/// One chip as declared by the tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipSpec {
    pub model: SidModel,
    pub channel: Channel,
    /// `None` when the chip is disabled.
    pub base: Option<u16>,
}

impl ChipSpec {
    #[must_use]
    pub const fn disabled(model: SidModel) -> Self {
        Self {
            model,
            channel: Channel::Both,
            base: None,
        }
    }
}

/// Whether `address` may hold a SID.
#[must_use]
pub const fn is_valid_base(address: u16) -> bool {
    address >= 0xD400 && (address < 0xD800 || (address >= 0xDE00 && address <= 0xDFE0))
}

/// Translate a header address byte to a base address, if it is usable.
#[must_use]
pub const fn chip_base(byte: u8) -> Option<u16> {
    let address = 0xD000 + (byte as u16) * 16;
    if is_valid_base(address) {
        Some(address)
    } else {
        None
    }
}

impl SidHeader {
    /// Model of the first chip: flags bits 4-5, 8580 when 2 or 3.
    #[must_use]
    pub fn primary_model(&self) -> SidModel {
        if (self.flags & 0x30) >= 0x20 {
            SidModel::Mos8580
        } else {
            SidModel::Mos6581
        }
    }

    /// All four chip slots, in index order.
    ///
    /// When only one chip ends up enabled it plays on both channels.
    #[must_use]
    pub fn chips(&self) -> [ChipSpec; 4] {
        let primary = self.primary_model();
        let flags_high = (self.flags >> 8) as u8;
        let flags_low = self.flags as u8;

        let mut chips = match self.layout() {
            HeaderLayout::Classic => [
                ChipSpec {
                    model: primary,
                    channel: Channel::Left,
                    base: Some(PRIMARY_BASE),
                },
                ChipSpec {
                    model: SidModel::from_bits(flags_low >> 6, primary),
                    channel: Channel::Right,
                    base: chip_base(self.extra[0]),
                },
                ChipSpec {
                    model: SidModel::from_bits(flags_high, primary),
                    channel: Channel::Both,
                    base: chip_base(self.extra[1]),
                },
                ChipSpec::disabled(primary),
            ],
            HeaderLayout::MultiSid => {
                let extra = |k: usize| {
                    let address = self.extra[2 * k];
                    let flags = self.extra[2 * k + 1];
                    ChipSpec {
                        model: SidModel::from_bits(flags >> 4, primary),
                        channel: Channel::from_flags(flags),
                        base: chip_base(address),
                    }
                };
                [
                    ChipSpec {
                        model: primary,
                        channel: Channel::from_flags(flags_high),
                        base: Some(PRIMARY_BASE),
                    },
                    extra(0),
                    extra(1),
                    extra(2),
                ]
            }
        };

        for chip in &mut chips[1..] {
            if chip.base.is_none() {
                *chip = ChipSpec::disabled(primary);
            }
        }
        if chips[1..].iter().all(|chip| chip.base.is_none()) {
            chips[0].channel = Channel::Both;
        }
        chips
    }

    /// Number of enabled chips declared by the tune.
    #[must_use]
    pub fn chip_count(&self) -> usize {
        self.chips().iter().filter(|chip| chip.base.is_some()).count()
    }
}
