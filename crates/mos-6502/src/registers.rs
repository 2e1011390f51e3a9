//! Register file of the 6510.

use crate::Status;
use crate::flags::{I, U};

/// Stack pointer of a routine called from outside the machine. A return
/// taken at this level ends the routine instead of popping.
pub const ROUTINE_STACK: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Next free byte of the stack page $0100-$01FF.
    pub s: u8,
    pub pc: u16,
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// After a hardware reset: S at $FD, IRQs masked.
    #[must_use]
    pub const fn new() -> Self {
        Self::at(0, 0xFD)
    }

    /// Ready to run a tune routine at `entry` with an empty stack.
    #[must_use]
    pub const fn routine(entry: u16) -> Self {
        Self::at(entry, ROUTINE_STACK)
    }

    const fn at(pc: u16, s: u8) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s,
            pc,
            p: Status(U | I),
        }
    }

    /// Whether a return now would leave the routine.
    #[must_use]
    pub const fn stack_empty(&self) -> bool {
        self.s == ROUTINE_STACK
    }

    pub fn push(&mut self) -> u16 {
        let addr = 0x0100 | u16::from(self.s);
        self.s = self.s.wrapping_sub(1);
        addr
    }

    pub fn pop(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        0x0100 | u16::from(self.s)
    }
}
