//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// The CPU accesses memory and peripherals through this trait. The bus
/// owns address decoding and routes each access to RAM, ROM or a chip.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Store the result of a read-modify-write instruction.
    ///
    /// The NMOS 6502 writes the unmodified byte back before the result.
    /// Buses with memory-mapped registers use this to see the first write
    /// (chips acknowledge interrupts on it). Plain memory only keeps the
    /// result.
    fn write_rmw(&mut self, address: u16, original: u8, modified: u8) {
        let _ = original;
        self.write(address, modified);
    }

    /// Internal CPU cycles that perform no bus access.
    fn tick(&mut self, cycles: u32) {
        let _ = cycles;
    }
}

/// Flat 64 KiB RAM bus for CPU tests.
pub struct SimpleBus {
    memory: Box<[u8; 0x1_0000]>,
    /// Every write seen, in order.
    pub writes: Vec<(u16, u8)>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x1_0000]),
            writes: Vec::new(),
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (offset, &byte) in data.iter().enumerate() {
            self.memory[usize::from(address.wrapping_add(offset as u16))] = byte;
        }
    }

    /// Read without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    /// Write without recording.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
        self.writes.push((address, value));
    }
}
