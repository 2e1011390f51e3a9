//! Playback machine memory.
//!
//! 64K RAM, a ROM shadow holding just enough KERNAL to dispatch interrupts,
//! and two views of the I/O area: what was last written, and what reads
//! return.
//!
//! # Banking
//!
//! The bank register at $01 selects what the CPU sees. CHAREN (bit 2) is
//! ignored: there is no character ROM.
//!
//! | $01 & 3 | $A000-$BFFF | $D000-$DFFF | $E000-$FFFF |
//! |---------|-------------|-------------|-------------|
//! | 3       | ROM         | I/O         | ROM         |
//! | 2       | RAM         | I/O         | ROM         |
//! | 1       | RAM         | I/O         | RAM         |
//! | 0       | RAM         | RAM         | RAM         |
//!
//! Writes always land in RAM unless I/O is visible at the address, in which
//! case only the I/O views change.
//!
//! # KERNAL stubs
//!
//! | Address | Routine                                                     |
//! |---------|-------------------------------------------------------------|
//! | $FF48   | IRQ/BRK entry: push A X Y, `JMP ($0316)` on BRK else `($0314)` |
//! | $EA31   | default IRQ handler: read $DC0D, then $EA81                 |
//! | $EA81   | pull Y X A, `RTI`                                           |
//! | $FE43   | NMI entry: `SEI`, `JMP ($0318)`                             |
//! | $FE47   | `RTI`                                                       |
//! | $FCE2   | reset: loops forever                                        |

const IO_START: u16 = 0xD000;
const IO_SIZE: usize = 0x1000;

const ROM_IRQ_ENTRY: u16 = 0xFF48;
const ROM_IRQ_HANDLER: u16 = 0xEA31;
const ROM_IRQ_RETURN: u16 = 0xEA81;
const ROM_NMI_ENTRY: u16 = 0xFE43;
const ROM_NMI_RETURN: u16 = 0xFE47;
const ROM_RESET: u16 = 0xFCE2;

#[rustfmt::skip]
const IRQ_ENTRY: [u8; 19] = [
    0x48,             // PHA
    0x8A, 0x48,       // TXA, PHA
    0x98, 0x48,       // TYA, PHA
    0xBA,             // TSX
    0xBD, 0x04, 0x01, // LDA $0104,X
    0x29, 0x10,       // AND #$10
    0xF0, 0x03,       // BEQ +3
    0x6C, 0x16, 0x03, // JMP ($0316)
    0x6C, 0x14, 0x03, // JMP ($0314)
];
const IRQ_HANDLER: [u8; 6] = [0xAD, 0x0D, 0xDC, 0x4C, 0x81, 0xEA];
const IRQ_RETURN: [u8; 6] = [0x68, 0xA8, 0x68, 0xAA, 0x68, 0x40];
const NMI_ENTRY: [u8; 4] = [0x78, 0x6C, 0x18, 0x03];

/// What the CPU sees at an address under the current bank setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ram,
    Rom,
    Io,
}

pub struct Memory {
    ram: Box<[u8; 0x1_0000]>,
    rom: Box<[u8; 0x1_0000]>,
    /// Last value written to each I/O address.
    io_write: Box<[u8; IO_SIZE]>,
    /// Value returned by reads of I/O addresses no chip answers for.
    io_read: Box<[u8; IO_SIZE]>,
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        let mut memory = Self {
            ram: Box::new([0; 0x1_0000]),
            rom: Box::new([0; 0x1_0000]),
            io_write: Box::new([0; IO_SIZE]),
            io_read: Box::new([0; IO_SIZE]),
        };
        memory.install_rom();
        memory.reset(true);
        memory
    }

    fn install_rom(&mut self) {
        let mut put = |address: u16, code: &[u8]| {
            let start = usize::from(address);
            self.rom[start..start + code.len()].copy_from_slice(code);
        };
        put(ROM_IRQ_ENTRY, &IRQ_ENTRY);
        put(ROM_IRQ_HANDLER, &IRQ_HANDLER);
        put(ROM_IRQ_RETURN, &IRQ_RETURN);
        put(ROM_NMI_ENTRY, &NMI_ENTRY);
        put(ROM_NMI_RETURN, &[0x40]);
        let [low, high] = ROM_RESET.to_le_bytes();
        put(ROM_RESET, &[0x4C, low, high]);
        put(0xFFFA, &ROM_NMI_ENTRY.to_le_bytes());
        put(0xFFFC, &ROM_RESET.to_le_bytes());
        put(0xFFFE, &ROM_IRQ_ENTRY.to_le_bytes());
    }

    /// Clear RAM and I/O, then set the values the KERNAL leaves behind
    /// after boot.
    pub fn reset(&mut self, pal: bool) {
        self.ram.fill(0);
        self.io_write.fill(0);
        self.io_read.fill(0);

        self.ram[0x00] = 0x2F;
        self.ram[0x01] = 0x37;
        self.ram[0xCB] = 0x40;
        self.ram[0x02A6] = u8::from(pal);
        self.set_ram_word(0x0314, ROM_IRQ_HANDLER);
        self.set_ram_word(0x0316, ROM_IRQ_RETURN);
        self.set_ram_word(0x0318, ROM_NMI_RETURN);
    }

    /// Copy `data` into RAM at `address`, stopping at $FFFF. Returns the
    /// number of bytes copied.
    pub fn load(&mut self, address: u16, data: &[u8]) -> usize {
        let start = usize::from(address);
        let len = data.len().min(0x1_0000 - start);
        self.ram[start..start + len].copy_from_slice(&data[..len]);
        len
    }

    /// Bank register ($01).
    #[must_use]
    pub fn bank(&self) -> u8 {
        self.ram[0x01]
    }

    pub fn set_bank(&mut self, value: u8) {
        self.ram[0x01] = value;
    }

    #[must_use]
    pub fn region(&self, address: u16) -> Region {
        let bank = self.bank() & 0x03;
        match address {
            0xA000..=0xBFFF if bank == 3 => Region::Rom,
            0xD000..=0xDFFF if bank != 0 => Region::Io,
            0xE000..=0xFFFF if bank & 0x02 != 0 => Region::Rom,
            _ => Region::Ram,
        }
    }

    /// CPU read of anything that is not a chip register.
    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        match self.region(address) {
            Region::Ram => self.ram[usize::from(address)],
            Region::Rom => self.rom[usize::from(address)],
            Region::Io => self.io_read_view(address),
        }
    }

    /// CPU write to anything that is not a chip register. Under visible
    /// I/O both views change.
    pub fn write(&mut self, address: u16, value: u8) {
        if self.region(address) == Region::Io {
            let index = io_index(address);
            self.io_write[index] = value;
            self.io_read[index] = value;
        } else {
            self.ram[usize::from(address)] = value;
        }
    }

    /// SID registers are write-only; the volume-and-filter block ($00-$18)
    /// reads back the last value written. The rest of each 32-byte block
    /// reads from the read view.
    #[must_use]
    pub fn sid_read(&self, address: u16) -> u8 {
        if address & 0x1F < 0x19 {
            self.io_write_view(address)
        } else {
            self.io_read_view(address)
        }
    }

    /// Record a chip register write in the write view only.
    pub fn set_io_written(&mut self, address: u16, value: u8) {
        self.io_write[io_index(address)] = value;
    }

    #[must_use]
    pub fn io_write_view(&self, address: u16) -> u8 {
        self.io_write[io_index(address)]
    }

    #[must_use]
    pub fn io_read_view(&self, address: u16) -> u8 {
        self.io_read[io_index(address)]
    }

    /// RAM contents regardless of banking.
    #[must_use]
    pub fn ram(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    #[must_use]
    pub fn ram_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.ram(address), self.ram(address.wrapping_add(1))])
    }

    pub fn set_ram_word(&mut self, address: u16, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.ram[usize::from(address)] = low;
        self.ram[usize::from(address.wrapping_add(1))] = high;
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

fn io_index(address: u16) -> usize {
    usize::from(address.wrapping_sub(IO_START)) & (IO_SIZE - 1)
}
