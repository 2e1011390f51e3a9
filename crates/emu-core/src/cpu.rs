//! CPU core trait.

use crate::Bus;

/// Interrupt inputs of a CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Maskable, level-triggered request.
    Irq,
    /// Non-maskable, edge-triggered request.
    Nmi,
}

/// An instruction-stepped CPU core.
///
/// The bus is passed in, not owned, so the machine can keep the chips
/// behind it and advance them between instructions.
pub trait Cpu {
    /// Execute one instruction and return the cycles it took.
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Reset registers and drop pending interrupts.
    fn reset(&mut self);

    /// Drive an interrupt input.
    ///
    /// IRQ is sampled at every instruction boundary while active. NMI
    /// latches on the inactive-to-active edge only.
    fn set_interrupt_line(&mut self, kind: Interrupt, active: bool);

    /// Enter a pending interrupt if one is accepted.
    ///
    /// Returns the cycles spent on the interrupt sequence, or `None` when
    /// nothing was pending or an IRQ is masked.
    fn service_interrupt<B: Bus>(&mut self, bus: &mut B) -> Option<u32>;

    /// Current program counter.
    fn pc(&self) -> u16;
}
