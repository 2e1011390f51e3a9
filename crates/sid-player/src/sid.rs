//! SID register address translation.
//!
//! Writes to $D400-$D5FF are matched against the chip table in index order.
//! The first chip whose 32-byte block holds the address takes the write as
//! `(chip, register)`. Writes no chip claims are dropped.

use format_sid::{Channel, ChipSpec, PRIMARY_BASE, SidHeader, SidModel, is_valid_base};
use serde::Serialize;

use crate::ConfigError;

/// First address the translator looks at.
pub const WINDOW_START: u16 = 0xD400;
/// Last address the translator looks at.
pub const WINDOW_END: u16 = 0xD5FF;
/// Register block size of one chip.
pub const CHIP_SPAN: u16 = 0x20;

/// A translated register write, stamped with the machine cycle it happened
/// on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SidWrite {
    pub chip: u8,
    pub register: u8,
    pub value: u8,
    pub cycle: u64,
}

/// Chip table used for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidMap {
    chips: [ChipSpec; 4],
}

impl Default for SidMap {
    fn default() -> Self {
        Self::single(SidModel::default())
    }
}

impl SidMap {
    /// One chip at $D400 on both channels.
    #[must_use]
    pub fn single(model: SidModel) -> Self {
        let mut chips = [ChipSpec::disabled(model); 4];
        chips[0] = ChipSpec {
            model,
            channel: Channel::Both,
            base: Some(PRIMARY_BASE),
        };
        Self { chips }
    }

    /// Check a chip table: every base must be a SID address and no two
    /// enabled blocks may overlap.
    pub fn new(chips: [ChipSpec; 4]) -> Result<Self, ConfigError> {
        let bases: Vec<(usize, u16)> = chips
            .iter()
            .enumerate()
            .filter_map(|(index, chip)| chip.base.map(|base| (index, base)))
            .collect();
        if bases.is_empty() {
            return Err(ConfigError::InvalidChipCount);
        }
        for &(index, base) in &bases {
            if !is_valid_base(base) {
                return Err(ConfigError::InvalidBase { index, base });
            }
        }
        for (i, &(first, a)) in bases.iter().enumerate() {
            for &(second, b) in &bases[i + 1..] {
                if a.abs_diff(b) < CHIP_SPAN {
                    return Err(ConfigError::Overlap {
                        first,
                        second,
                        base: b,
                    });
                }
            }
        }
        Ok(Self { chips })
    }

    /// Build the chip table for a tune, limited to `limit` physical chips.
    ///
    /// A table that fails validation is replaced by a single chip, with a
    /// warning.
    #[must_use]
    pub fn for_tune(header: &SidHeader, limit: usize, forced_model: Option<SidModel>) -> Self {
        let mut chips = header.chips();
        if let Some(model) = forced_model {
            for chip in &mut chips {
                chip.model = model;
            }
        }

        let mut map = match Self::new(chips) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("{e}; falling back to one SID at ${PRIMARY_BASE:04X}");
                return Self::single(chips[0].model);
            }
        };

        let mut enabled = 0;
        for (index, chip) in map.chips.iter_mut().enumerate() {
            if chip.base.is_none() {
                continue;
            }
            enabled += 1;
            if enabled > limit {
                log::info!("chip {index} disabled: device has {limit} SID slot(s)");
                chip.base = None;
            }
        }
        if map.enabled_count() == 1 {
            for chip in &mut map.chips {
                if chip.base.is_some() {
                    chip.channel = Channel::Both;
                }
            }
        }
        for (index, chip) in map.chips.iter().enumerate() {
            if let Some(base) = chip.base
                && base.saturating_add(CHIP_SPAN - 1) > WINDOW_END
            {
                log::warn!("chip {index} at ${base:04X} is outside $D400-$D5FF and stays silent");
            }
        }
        map
    }

    #[must_use]
    pub fn chips(&self) -> &[ChipSpec; 4] {
        &self.chips
    }

    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.chips.iter().filter(|chip| chip.base.is_some()).count()
    }

    /// Which chip, if any, owns `address`.
    #[must_use]
    pub fn chip_for(&self, address: u16) -> Option<u8> {
        if !(WINDOW_START..=WINDOW_END).contains(&address) {
            return None;
        }
        self.chips
            .iter()
            .position(|chip| {
                chip.base
                    .is_some_and(|base| (base..base.saturating_add(CHIP_SPAN)).contains(&address))
            })
            .map(|index| index as u8)
    }

    #[must_use]
    pub fn translate(&self, address: u16, value: u8, cycle: u64) -> Option<SidWrite> {
        self.chip_for(address).map(|chip| SidWrite {
            chip,
            register: (address & (CHIP_SPAN - 1)) as u8,
            value,
            cycle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format_sid::TuneFormat;

    fn chip(base: Option<u16>) -> ChipSpec {
        ChipSpec {
            model: SidModel::Mos6581,
            channel: Channel::Left,
            base,
        }
    }

    fn layouts() -> Vec<SidMap> {
        let d = ChipSpec::disabled(SidModel::Mos6581);
        [
            [chip(Some(0xD400)), d, d, d],
            [chip(Some(0xD400)), chip(Some(0xD420)), d, d],
            [chip(Some(0xD400)), chip(Some(0xD500)), chip(Some(0xD440)), d],
            [
                chip(Some(0xD400)),
                chip(Some(0xD420)),
                chip(Some(0xD440)),
                chip(Some(0xD460)),
            ],
            [chip(Some(0xD400)), chip(Some(0xDE00)), d, chip(Some(0xD5E0))],
        ]
        .into_iter()
        .map(|chips| SidMap::new(chips).expect("valid layout"))
        .collect()
    }

    #[test]
    fn translation_is_deterministic_across_the_window() {
        for map in layouts() {
            for address in WINDOW_START..=WINDOW_END {
                let expected = map.chips().iter().position(|c| {
                    c.base.is_some_and(|b| address >= b && address < b + CHIP_SPAN)
                });
                let write = map.translate(address, 0x5A, 99);
                assert_eq!(write, map.translate(address, 0x5A, 99));
                match (expected, write) {
                    (None, None) => {}
                    (Some(index), Some(w)) => {
                        assert_eq!(usize::from(w.chip), index);
                        assert_eq!(u16::from(w.register), address & 0x1F);
                        assert_eq!((w.value, w.cycle), (0x5A, 99));
                    }
                    other => panic!("${address:04X}: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn nothing_outside_the_window() {
        let map = SidMap::default();
        assert_eq!(map.translate(0xD3FF, 0, 0), None);
        assert_eq!(map.translate(0xD600, 0, 0), None);
        let chips = layouts().remove(4);
        assert_eq!(chips.chip_for(0xDE00), None);
    }

    #[test]
    fn rejects_overlap_and_bad_base() {
        let d = ChipSpec::disabled(SidModel::Mos6581);
        assert_eq!(
            SidMap::new([chip(Some(0xD400)), chip(Some(0xD410)), d, d]),
            Err(ConfigError::Overlap {
                first: 0,
                second: 1,
                base: 0xD410
            })
        );
        assert_eq!(
            SidMap::new([chip(Some(0xD400)), d, chip(Some(0xD800)), d]),
            Err(ConfigError::InvalidBase {
                index: 2,
                base: 0xD800
            })
        );
        assert_eq!(SidMap::new([d; 4]), Err(ConfigError::InvalidChipCount));
    }

    #[test]
    fn tune_chips_limited_to_device() {
        let mut header = SidHeader::new(TuneFormat::Psid);
        header.extra[0] = 0x42;
        header.extra[1] = 0x44;
        let map = SidMap::for_tune(&header, 2, None);
        assert_eq!(map.enabled_count(), 2);
        assert_eq!(map.chip_for(0xD440), None);
        assert_eq!(map.chips()[0].channel, Channel::Left);

        let map = SidMap::for_tune(&header, 1, Some(SidModel::Mos8580));
        assert_eq!(map.enabled_count(), 1);
        assert_eq!(map.chips()[0].channel, Channel::Both);
        assert_eq!(map.chips()[0].model, SidModel::Mos8580);
    }

    #[test]
    fn overlapping_tune_falls_back_to_one_chip() {
        let mut header = SidHeader::new(TuneFormat::Psid);
        header.version = format_sid::MULTI_SID_VERSION;
        header.data_offset = 0x80;
        header.extra = [0x42, 0x00, 0x42, 0x00, 0x00, 0x00];
        let map = SidMap::for_tune(&header, 4, None);
        assert_eq!(map, SidMap::single(SidModel::Mos6581));
    }
}
