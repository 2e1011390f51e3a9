//! Core traits and types shared by the chip crates.
//!
//! Time is counted in CPU cycles. The CPU reports how many cycles each
//! instruction took and the machine advances every other chip by that amount.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, SimpleBus};
pub use cpu::{Cpu, Interrupt};
pub use observable::{Observable, Value};
