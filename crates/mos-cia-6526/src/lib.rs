//! MOS 6526 Complex Interface Adapter: timers, interrupt control and the
//! time-of-day clock.
//!
//! The player machine has two of them:
//! - CIA 1 ($DC00-$DC0F): timer interrupts drive the CPU's IRQ line
//! - CIA 2 ($DD00-$DD0F): timer interrupts drive NMI
//!
//! # Registers
//!
//! | Reg | Read               | Write                |
//! |-----|--------------------|----------------------|
//! | $x0 | Port A             | Port A               |
//! | $x1 | Port B             | Port B               |
//! | $x2 | Port A DDR         | Port A DDR           |
//! | $x3 | Port B DDR         | Port B DDR           |
//! | $x4 | Timer A low        | Timer A latch low    |
//! | $x5 | Timer A high       | Timer A latch high   |
//! | $x6 | Timer B low        | Timer B latch low    |
//! | $x7 | Timer B high       | Timer B latch high   |
//! | $x8 | TOD tenths (BCD)   | TOD tenths           |
//! | $x9 | TOD seconds (BCD)  | TOD seconds          |
//! | $xA | TOD minutes (BCD)  | TOD minutes          |
//! | $xB | TOD hours (BCD)    | TOD hours            |
//! | $xC | Serial data        | Serial data          |
//! | $xD | ICR (read clears)  | ICR mask set/clear   |
//! | $xE | Control A          | Control A            |
//! | $xF | Control B          | Control B            |
//!
//! Timers are advanced in bulk by the number of cycles the last CPU
//! instruction took, not cycle by cycle. A counter that reaches zero or
//! below reloads from the latch and keeps the remainder, so the number of
//! underflows over any split of the same total is the same.

use emu_core::{Observable, Value};

/// Control register: timer running.
pub const CR_START: u8 = 0x01;
/// Control register: stop after one underflow.
pub const CR_ONESHOT: u8 = 0x08;
/// Control register: copy latch into counter (strobe, reads back 0).
pub const CR_FORCE_LOAD: u8 = 0x10;

/// ICR bit: timer A underflow.
pub const ICR_TIMER_A: u8 = 0x01;
/// ICR bit: timer B underflow.
pub const ICR_TIMER_B: u8 = 0x02;
/// ICR bit: interrupt output active.
pub const ICR_IRQ: u8 = 0x80;

/// One 16-bit interval timer.
#[derive(Debug, Clone, Copy)]
struct Timer {
    counter: u16,
    latch: u16,
    control: u8,
}

impl Timer {
    const fn new() -> Self {
        Self {
            counter: 0xFFFF,
            latch: 0xFFFF,
            control: 0,
        }
    }

    fn running(&self) -> bool {
        self.control & CR_START != 0
    }

    /// Count down by `ticks`, returning the number of underflows.
    fn count(&mut self, ticks: u32) -> u32 {
        if ticks == 0 || !self.running() {
            return 0;
        }
        // A zero latch would reload to zero forever.
        let reload = i64::from(self.latch.max(1));
        let mut remaining = i64::from(self.counter) - i64::from(ticks);
        let mut underflows = 0;
        while remaining <= 0 {
            underflows += 1;
            if self.control & CR_ONESHOT != 0 {
                self.control &= !CR_START;
                remaining = i64::from(self.latch);
                break;
            }
            remaining += reload;
        }
        self.counter = remaining as u16;
        underflows
    }

    fn write_control(&mut self, value: u8) {
        if value & CR_FORCE_LOAD != 0 {
            self.counter = self.latch;
        }
        self.control = value & !CR_FORCE_LOAD;
    }

    fn write_latch_low(&mut self, value: u8) {
        self.latch = (self.latch & 0xFF00) | u16::from(value);
    }

    fn write_latch_high(&mut self, value: u8) {
        self.latch = (self.latch & 0x00FF) | (u16::from(value) << 8);
        if !self.running() {
            self.counter = self.latch;
        }
    }
}

/// BCD time-of-day clock.
#[derive(Debug, Clone, Copy, Default)]
struct Tod {
    tenths: u8,
    seconds: u8,
    minutes: u8,
    /// Hours 1-12 in BCD, bit 7 = PM.
    hours: u8,
}

/// Increment a BCD byte, returning the new value and whether it reached
/// `limit` (given in BCD) and wrapped to zero.
fn bcd_increment(value: u8, limit: u8) -> (u8, bool) {
    let mut next = value.wrapping_add(1);
    if next & 0x0F > 9 {
        next = (next & 0xF0).wrapping_add(0x10);
    }
    if next >= limit { (0, true) } else { (next, false) }
}

impl Tod {
    fn tick_tenth(&mut self) {
        self.tenths += 1;
        if self.tenths < 10 {
            return;
        }
        self.tenths = 0;
        let (seconds, carry) = bcd_increment(self.seconds, 0x60);
        self.seconds = seconds;
        if !carry {
            return;
        }
        let (minutes, carry) = bcd_increment(self.minutes, 0x60);
        self.minutes = minutes;
        if !carry {
            return;
        }
        let pm = self.hours & 0x80;
        let hours = self.hours & 0x1F;
        self.hours = match hours {
            0x11 => 0x12 | (pm ^ 0x80),
            0x12 => 0x01 | pm,
            _ => bcd_increment(hours, 0x13).0 | pm,
        };
    }
}

/// CIA 6526 instance.
pub struct Cia {
    port_a: u8,
    port_b: u8,
    ddr_a: u8,
    ddr_b: u8,
    serial: u8,

    timer_a: Timer,
    timer_b: Timer,

    /// Interrupt sources latched since the last ICR read, plus bit 7.
    icr_status: u8,
    /// Sources allowed to raise bit 7.
    icr_mask: u8,

    tod: Tod,

    underflows_a: u64,
    underflows_b: u64,
}

impl Cia {
    /// Power-on state: both timers stopped with latches at $FFFF, all
    /// interrupt sources masked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port_a: 0xFF,
            port_b: 0xFF,
            ddr_a: 0,
            ddr_b: 0,
            serial: 0,
            timer_a: Timer::new(),
            timer_b: Timer::new(),
            icr_status: 0,
            icr_mask: 0,
            tod: Tod::default(),
            underflows_a: 0,
            underflows_b: 0,
        }
    }

    /// Advance both timers by `cycles` and return the interrupt output.
    ///
    /// Timer B counts either Φ2 cycles or timer A underflows, selected by
    /// CRB bits 5-6. Counting the CNT pin is not modelled.
    pub fn advance(&mut self, cycles: u32) -> bool {
        let a = self.timer_a.count(cycles);
        if a > 0 {
            self.underflows_a += u64::from(a);
            self.raise(ICR_TIMER_A);
        }

        let b_ticks = match (self.timer_b.control >> 5) & 0x03 {
            0 => cycles,
            2 => a,
            _ => 0,
        };
        let b = self.timer_b.count(b_ticks);
        if b > 0 {
            self.underflows_b += u64::from(b);
            self.raise(ICR_TIMER_B);
        }

        self.interrupt_active()
    }

    fn raise(&mut self, source: u8) {
        self.icr_status |= source;
        if self.icr_mask & source != 0 {
            self.icr_status |= ICR_IRQ;
        }
    }

    /// Interrupt output (ICR bit 7).
    #[must_use]
    pub fn interrupt_active(&self) -> bool {
        self.icr_status & ICR_IRQ != 0
    }

    /// Read a register without side effects.
    ///
    /// The ICR is returned as-is; the bus calls [`Cia::read_icr_and_clear`]
    /// for CPU reads of $xD.
    #[must_use]
    pub fn read(&self, reg: u8) -> u8 {
        match reg & 0x0F {
            0x00 => (self.port_a & self.ddr_a) | !self.ddr_a,
            0x01 => (self.port_b & self.ddr_b) | !self.ddr_b,
            0x02 => self.ddr_a,
            0x03 => self.ddr_b,
            0x04 => self.timer_a.counter as u8,
            0x05 => (self.timer_a.counter >> 8) as u8,
            0x06 => self.timer_b.counter as u8,
            0x07 => (self.timer_b.counter >> 8) as u8,
            0x08 => self.tod.tenths,
            0x09 => self.tod.seconds,
            0x0A => self.tod.minutes,
            0x0B => self.tod.hours,
            0x0C => self.serial,
            0x0D => self.icr_status,
            0x0E => self.timer_a.control,
            _ => self.timer_b.control,
        }
    }

    /// CPU read of the ICR: returns the latched sources and clears them,
    /// which also drops the interrupt output.
    pub fn read_icr_and_clear(&mut self) -> u8 {
        std::mem::take(&mut self.icr_status)
    }

    /// Write a register.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x0F {
            0x00 => self.port_a = value,
            0x01 => self.port_b = value,
            0x02 => self.ddr_a = value,
            0x03 => self.ddr_b = value,
            0x04 => self.timer_a.write_latch_low(value),
            0x05 => self.timer_a.write_latch_high(value),
            0x06 => self.timer_b.write_latch_low(value),
            0x07 => self.timer_b.write_latch_high(value),
            0x08 => self.tod.tenths = value & 0x0F,
            0x09 => self.tod.seconds = value & 0x7F,
            0x0A => self.tod.minutes = value & 0x7F,
            0x0B => self.tod.hours = value & 0x9F,
            0x0C => self.serial = value,
            0x0D => {
                // Bit 7 selects set (1) or clear (0) for the given sources
                if value & 0x80 != 0 {
                    self.icr_mask |= value & 0x1F;
                } else {
                    self.icr_mask &= !(value & 0x1F);
                }
                if self.icr_status & self.icr_mask & 0x1F != 0 {
                    self.icr_status |= ICR_IRQ;
                }
            }
            0x0E => self.timer_a.write_control(value),
            _ => self.timer_b.write_control(value),
        }
    }

    /// Overwrite the interrupt status, as if the listed sources had fired.
    ///
    /// Used when a frame is simulated rather than timed, so a handler that
    /// reads $DC0D sees the interrupt it expects.
    pub fn force_interrupt_flags(&mut self, flags: u8) {
        self.icr_status = flags;
    }

    /// Advance the low byte of timer A's counter by `cycles`, wrapping.
    ///
    /// When timers are not run, this keeps loops that poll $DC04 for change
    /// from spinning forever.
    pub fn drift_timer_a(&mut self, cycles: u32) {
        let low = (self.timer_a.counter as u8).wrapping_add(cycles as u8);
        self.timer_a.counter = (self.timer_a.counter & 0xFF00) | u16::from(low);
    }

    /// Advance the time-of-day clock by a tenth of a second.
    pub fn tick_tod(&mut self) {
        self.tod.tick_tenth();
    }

    #[must_use]
    pub fn timer_a_latch(&self) -> u16 {
        self.timer_a.latch
    }

    #[must_use]
    pub fn timer_b_latch(&self) -> u16 {
        self.timer_b.latch
    }

    #[must_use]
    pub fn timer_a(&self) -> u16 {
        self.timer_a.counter
    }

    #[must_use]
    pub fn timer_b(&self) -> u16 {
        self.timer_b.counter
    }

    #[must_use]
    pub fn icr_status(&self) -> u8 {
        self.icr_status
    }

    #[must_use]
    pub fn icr_mask(&self) -> u8 {
        self.icr_mask
    }

    /// Total timer A underflows since power-on.
    #[must_use]
    pub fn timer_a_underflows(&self) -> u64 {
        self.underflows_a
    }
}

impl Default for Cia {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for Cia {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "timer_a.counter" => Some(self.timer_a.counter.into()),
            "timer_a.latch" => Some(self.timer_a.latch.into()),
            "timer_a.running" => Some(self.timer_a.running().into()),
            "timer_a.underflows" => Some(self.underflows_a.into()),
            "timer_b.counter" => Some(self.timer_b.counter.into()),
            "timer_b.latch" => Some(self.timer_b.latch.into()),
            "timer_b.running" => Some(self.timer_b.running().into()),
            "timer_b.underflows" => Some(self.underflows_b.into()),
            "icr.status" => Some(self.icr_status.into()),
            "icr.mask" => Some(self.icr_mask.into()),
            "cra" => Some(self.timer_a.control.into()),
            "crb" => Some(self.timer_b.control.into()),
            "tod" => Some(
                format!(
                    "{:02X}:{:02X}:{:02X}.{}",
                    self.tod.hours & 0x1F,
                    self.tod.minutes,
                    self.tod.seconds,
                    self.tod.tenths
                )
                .into(),
            ),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "timer_a.counter",
            "timer_a.latch",
            "timer_a.running",
            "timer_a.underflows",
            "timer_b.counter",
            "timer_b.latch",
            "timer_b.running",
            "timer_b.underflows",
            "icr.status",
            "icr.mask",
            "cra",
            "crb",
            "tod",
        ]
    }
}
