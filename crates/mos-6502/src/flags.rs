//! Processor status register (P).

/// Carry.
pub const C: u8 = 0x01;
/// Zero.
pub const Z: u8 = 0x02;
/// Interrupt disable. IRQ is ignored while set.
pub const I: u8 = 0x04;
/// Decimal mode for ADC/SBC.
pub const D: u8 = 0x08;
/// Break. Only exists in the pushed copy of P.
pub const B: u8 = 0x10;
/// Unused, always reads as 1.
pub const U: u8 = 0x20;
/// Overflow.
pub const V: u8 = 0x40;
/// Negative.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Status as pulled by PLP/RTI: unused set, break dropped.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self((value | U) & !B)
    }

    /// Byte pushed by BRK and PHP.
    #[must_use]
    pub const fn to_byte_brk(self) -> u8 {
        self.0 | U | B
    }

    /// Byte pushed by IRQ and NMI.
    #[must_use]
    pub const fn to_byte_irq(self) -> u8 {
        (self.0 | U) & !B
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Update N and Z from a result.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }
}
