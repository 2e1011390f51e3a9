//! Instruction-stepped MOS 6502/6510 CPU.
//!
//! Each `step()` executes one whole instruction and returns its cycle count,
//! page-crossing and branch penalties included. Bus timing inside an
//! instruction is not modelled; the machine advances its chips by the
//! returned count.
//!
//! # Returning to the caller
//!
//! A tune's init and play routines are called "from nowhere": the CPU is
//! primed with [`Mos6502::init`] and an empty stack. An `RTS` executed with
//! the stack pointer at `$FF` does not pop; `step()` returns [`RETURNED`]
//! instead. `RTI` in the same position returns [`HALTED`]. Test with
//! [`is_finished`]. PC is left on the returning instruction, so an
//! interrupt taken afterwards resumes there and finishes again.
//!
//! # Undocumented opcodes
//!
//! The stable ones tunes rely on are implemented: LAX, SAX, DCP, ISC, SLO,
//! RLA, SRE, RRA, ANC, ALR, ARR, SBX and the multi-byte NOPs. Everything
//! else (JAM included) executes as a two-cycle no-op.

mod addressing;
mod cpu;
pub mod flags;
mod registers;

pub use cpu::Mos6502;
pub use flags::Status;
pub use registers::{ROUTINE_STACK, Registers};

/// `step()` result for an `RTS` at the outermost level.
pub const RETURNED: u32 = 0xFF;

/// `step()` result for an `RTI` at the outermost level.
pub const HALTED: u32 = 0xFE;

/// Any `step()` result at or above this is a sentinel, not a cycle count.
pub const FINISHED_THRESHOLD: u32 = 0xFE;

/// Whether a `step()` result means the called routine has returned.
#[must_use]
pub const fn is_finished(cycles: u32) -> bool {
    cycles >= FINISHED_THRESHOLD
}
