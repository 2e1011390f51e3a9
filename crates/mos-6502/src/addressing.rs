//! 6502 addressing modes.
//!
//! | Mode             | Syntax     | Read | Write | RMW |
//! |------------------|------------|------|-------|-----|
//! | Immediate        | `#$nn`     | 2    | -     | -   |
//! | Zero page        | `$nn`      | 3    | 3     | 5   |
//! | Zero page,X / Y  | `$nn,X`    | 4    | 4     | 6   |
//! | Absolute         | `$nnnn`    | 4    | 4     | 6   |
//! | Absolute,X / Y   | `$nnnn,X`  | 4+p  | 5     | 7   |
//! | Indexed indirect | `($nn,X)`  | 6    | 6     | 8   |
//! | Indirect indexed | `($nn),Y`  | 5+p  | 6     | 8   |
//!
//! `p` is one extra cycle when indexing crosses a page boundary.

use emu_core::Bus;

use crate::Mos6502;

/// Operand addressing for memory instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndexedIndirect,
    IndirectIndexed,
}

impl Mode {
    pub(crate) const fn read_cycles(self) -> u32 {
        match self {
            Mode::Immediate => 2,
            Mode::ZeroPage => 3,
            Mode::ZeroPageX | Mode::ZeroPageY | Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY => 4,
            Mode::IndirectIndexed => 5,
            Mode::IndexedIndirect => 6,
        }
    }

    pub(crate) const fn write_cycles(self) -> u32 {
        match self {
            Mode::Immediate => 2,
            Mode::ZeroPage => 3,
            Mode::ZeroPageX | Mode::ZeroPageY | Mode::Absolute => 4,
            Mode::AbsoluteX | Mode::AbsoluteY => 5,
            Mode::IndexedIndirect | Mode::IndirectIndexed => 6,
        }
    }

    pub(crate) const fn rmw_cycles(self) -> u32 {
        match self {
            Mode::Immediate => 2,
            Mode::ZeroPage => 5,
            Mode::ZeroPageX | Mode::ZeroPageY | Mode::Absolute => 6,
            Mode::AbsoluteX | Mode::AbsoluteY => 7,
            Mode::IndexedIndirect | Mode::IndirectIndexed => 8,
        }
    }
}

/// Mode of the ALU column (`aaabbb01`) and of the undocumented `aaabbb11`
/// column, selected by the `bbb` bits.
pub(crate) const fn alu_mode(opcode: u8) -> Mode {
    match (opcode >> 2) & 0x07 {
        0 => Mode::IndexedIndirect,
        1 => Mode::ZeroPage,
        2 => Mode::Immediate,
        3 => Mode::Absolute,
        4 => Mode::IndirectIndexed,
        5 => Mode::ZeroPageX,
        6 => Mode::AbsoluteY,
        _ => Mode::AbsoluteX,
    }
}

/// Mode of the shift/increment column (`aaabbb10`).
pub(crate) const fn shift_mode(opcode: u8) -> Mode {
    match (opcode >> 2) & 0x07 {
        1 => Mode::ZeroPage,
        3 => Mode::Absolute,
        5 => Mode::ZeroPageX,
        _ => Mode::AbsoluteX,
    }
}

impl Mos6502 {
    /// Fetch the byte at PC and advance PC.
    pub(crate) fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let low = self.fetch(bus);
        let high = self.fetch(bus);
        u16::from_le_bytes([low, high])
    }

    pub(crate) fn read_word<B: Bus>(bus: &mut B, addr: u16) -> u16 {
        let low = bus.read(addr);
        let high = bus.read(addr.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Pointer read that stays inside the page: `JMP ($xxFF)` takes its high
    /// byte from `$xx00`, and zero-page pointers wrap at `$FF`.
    pub(crate) fn read_word_in_page<B: Bus>(bus: &mut B, addr: u16) -> u16 {
        let low = bus.read(addr);
        let high = bus.read((addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF));
        u16::from_le_bytes([low, high])
    }

    pub(crate) fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let addr = self.regs.push();
        bus.write(addr, value);
    }

    pub(crate) fn pull<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let addr = self.regs.pop();
        bus.read(addr)
    }

    /// Push high byte first so the word reads back little-endian.
    pub(crate) fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.push(bus, high);
        self.push(bus, low);
    }

    pub(crate) fn pull_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let low = self.pull(bus);
        let high = self.pull(bus);
        u16::from_le_bytes([low, high])
    }

    /// Fetch the operand bytes for `mode` and return the effective address
    /// and whether indexing crossed a page.
    ///
    /// Immediate mode returns the address of the operand byte itself.
    pub(crate) fn resolve<B: Bus>(&mut self, bus: &mut B, mode: Mode) -> (u16, bool) {
        match mode {
            Mode::Immediate => {
                let addr = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                (addr, false)
            }
            Mode::ZeroPage => (u16::from(self.fetch(bus)), false),
            Mode::ZeroPageX => (u16::from(self.fetch(bus).wrapping_add(self.regs.x)), false),
            Mode::ZeroPageY => (u16::from(self.fetch(bus).wrapping_add(self.regs.y)), false),
            Mode::Absolute => (self.fetch_word(bus), false),
            Mode::AbsoluteX => {
                let base = self.fetch_word(bus);
                Self::indexed(base, self.regs.x)
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word(bus);
                Self::indexed(base, self.regs.y)
            }
            Mode::IndexedIndirect => {
                let pointer = self.fetch(bus).wrapping_add(self.regs.x);
                (Self::read_word_in_page(bus, u16::from(pointer)), false)
            }
            Mode::IndirectIndexed => {
                let pointer = self.fetch(bus);
                let base = Self::read_word_in_page(bus, u16::from(pointer));
                Self::indexed(base, self.regs.y)
            }
        }
    }

    fn indexed(base: u16, index: u8) -> (u16, bool) {
        let addr = base.wrapping_add(u16::from(index));
        (addr, (base ^ addr) & 0xFF00 != 0)
    }

    /// Relative branch. Returns the instruction's cycle count.
    pub(crate) fn branch_if<B: Bus>(&mut self, bus: &mut B, taken: bool) -> u32 {
        let offset = self.fetch(bus) as i8;
        if !taken {
            return 2;
        }
        let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
        let crossed = (target ^ self.regs.pc) & 0xFF00 != 0;
        self.regs.pc = target;
        if crossed { 4 } else { 3 }
    }
}
