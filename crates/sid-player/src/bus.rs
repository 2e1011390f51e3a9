//! Playback machine bus: memory and I/O routing.
//!
//! Implements `emu_core::Bus`. Routes CPU accesses through the bank
//! decoder, hands chip registers to the CIAs and the VIC-II, and collects
//! SID writes for the scheduler.
//!
//! Every access advances `clock` by one cycle, so a write is stamped with
//! the cycle it actually happens on within its instruction.

use emu_core::Bus;
use format_sid::TuneFormat;
use mos_cia_6526::Cia;
use mos_vic_ii::{VideoStandard, Vic};

use crate::memory::{Memory, Region};
use crate::sid::{SidMap, SidWrite};

/// CIA 1 timer A latch the KERNAL sets up at boot.
pub const DEFAULT_CIA_LATCH: u16 = 0x4024;

pub struct PlayerBus {
    pub memory: Memory,
    pub vic: Vic,
    pub cia1: Cia,
    pub cia2: Cia,
    pub sids: SidMap,
    /// SID writes not yet taken by the scheduler.
    pub pending: Vec<SidWrite>,
    /// Machine cycle of the current access.
    pub clock: u64,
}

impl PlayerBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Memory::new(),
            vic: Vic::default(),
            cia1: Cia::new(),
            cia2: Cia::new(),
            sids: SidMap::default(),
            pending: Vec::new(),
            clock: 0,
        }
    }

    /// Power the machine back up as the KERNAL leaves it, for a tune of the
    /// given format and video standard.
    pub fn reset(&mut self, standard: VideoStandard, format: TuneFormat) {
        self.memory.reset(standard == VideoStandard::Pal);

        self.vic = Vic::new(standard);
        if format == TuneFormat::Rsid {
            self.io_write(0xD011, 0x8B);
            self.io_write(0xD012, 0x37);
        }

        self.cia1 = Cia::new();
        let [low, high] = DEFAULT_CIA_LATCH.to_le_bytes();
        self.cia1.write(0x04, low);
        self.cia1.write(0x05, high);
        self.cia1.write(0x0D, 0x81);
        self.cia1.write(0x0E, 0x01);
        self.cia2 = Cia::new();

        self.pending.clear();
    }

    /// Write to a chip or plain I/O address. Only called while I/O is
    /// visible.
    fn io_write(&mut self, address: u16, value: u8) {
        match address {
            0xD000..=0xD3FF => {
                self.memory.set_io_written(address, value);
                self.vic.write((address & 0x3F) as u8, value);
            }
            0xD400..=0xD7FF | 0xDE00..=0xDFFF => {
                self.memory.set_io_written(address, value);
                if let Some(write) = self.sids.translate(address, value, self.clock) {
                    self.pending.push(write);
                }
            }
            0xDC00..=0xDCFF => {
                self.memory.set_io_written(address, value);
                self.cia1.write((address & 0x0F) as u8, value);
            }
            0xDD00..=0xDDFF => {
                self.memory.set_io_written(address, value);
                self.cia2.write((address & 0x0F) as u8, value);
            }
            _ => self.memory.write(address, value),
        }
    }
}

impl Default for PlayerBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for PlayerBus {
    fn read(&mut self, address: u16) -> u8 {
        self.clock += 1;
        if self.memory.region(address) != Region::Io {
            return self.memory.read(address);
        }
        match address {
            0xD000..=0xD3FF => self.vic.read((address & 0x3F) as u8),
            0xD400..=0xD7FF => self.memory.sid_read(address),
            0xDC00..=0xDCFF => match (address & 0x0F) as u8 {
                0x0D => self.cia1.read_icr_and_clear(),
                reg => self.cia1.read(reg),
            },
            0xDD00..=0xDDFF => match (address & 0x0F) as u8 {
                0x0D => self.cia2.read_icr_and_clear(),
                reg => self.cia2.read(reg),
            },
            _ => self.memory.read(address),
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        self.clock += 1;
        if self.memory.region(address) == Region::Io {
            self.io_write(address, value);
        } else {
            self.memory.write(address, value);
        }
    }

    /// I/O registers get the unmodified byte, which is what a chip sees
    /// first and is how `INC $D019` style acknowledges work. Memory keeps
    /// the result.
    fn write_rmw(&mut self, address: u16, original: u8, modified: u8) {
        self.clock += 2;
        if self.memory.region(address) == Region::Io {
            self.io_write(address, original);
        } else {
            self.memory.write(address, modified);
        }
    }
}
