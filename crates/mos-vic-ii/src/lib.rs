//! MOS 6569 (PAL) / 6567 (NTSC) VIC-II, reduced to what tune playback
//! needs: the raster counter and the raster-compare interrupt.
//!
//! No graphics are generated. The chip counts cycles into raster lines and
//! raises an IRQ when the current line matches the compare line.
//!
//! # Registers used
//!
//! | Reg  | Read                       | Write                       |
//! |------|----------------------------|-----------------------------|
//! | $11  | bit 7 = raster line bit 8  | bit 7 = compare line bit 8  |
//! | $12  | raster line bits 0-7       | compare line bits 0-7       |
//! | $19  | interrupt status           | any write acknowledges      |
//! | $1A  | interrupt enable           | interrupt enable            |
//!
//! Other registers read back what was written. Registers repeat every 64
//! bytes across $D000-$D3FF.

use emu_core::{Observable, Value};

/// Raster interrupt status/enable bit.
pub const IRQ_RASTER: u8 = 0x01;
/// Interrupt status: any enabled source active.
pub const IRQ_ANY: u8 = 0x80;

/// Video timing standard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VideoStandard {
    /// 50 Hz, 312 lines, 63 cycles per line.
    #[default]
    Pal,
    /// 60 Hz, 263 lines, 65 cycles per line.
    Ntsc,
}

impl VideoStandard {
    /// CPU clock frequency in Hz.
    #[must_use]
    pub const fn cpu_clock(self) -> u32 {
        match self {
            VideoStandard::Pal => 985_248,
            VideoStandard::Ntsc => 1_022_727,
        }
    }

    #[must_use]
    pub const fn cycles_per_line(self) -> u32 {
        match self {
            VideoStandard::Pal => 63,
            VideoStandard::Ntsc => 65,
        }
    }

    #[must_use]
    pub const fn lines_per_frame(self) -> u16 {
        match self {
            VideoStandard::Pal => 312,
            VideoStandard::Ntsc => 263,
        }
    }

    /// Cycles per frame: 19656 PAL, 17095 NTSC.
    #[must_use]
    pub const fn cycles_per_frame(self) -> u32 {
        self.cycles_per_line() * self.lines_per_frame() as u32
    }
}

/// VIC-II raster state.
pub struct Vic {
    standard: VideoStandard,
    /// Register write view.
    regs: [u8; 0x40],
    /// Current raster line.
    raster_line: u16,
    /// Cycles accumulated into the current line.
    line_cycles: u32,
    /// $D019 interrupt status.
    irq_status: u8,
}

impl Vic {
    #[must_use]
    pub fn new(standard: VideoStandard) -> Self {
        Self {
            standard,
            regs: [0; 0x40],
            raster_line: 0,
            line_cycles: 0,
            irq_status: 0,
        }
    }

    /// Switch timing standard and restart the frame at line 0.
    pub fn set_standard(&mut self, standard: VideoStandard) {
        self.standard = standard;
        self.raster_line = 0;
        self.line_cycles = 0;
    }

    #[must_use]
    pub fn standard(&self) -> VideoStandard {
        self.standard
    }

    /// Cycles in one frame for the current standard.
    #[must_use]
    pub fn frame_cycles(&self) -> u32 {
        self.standard.cycles_per_frame()
    }

    #[must_use]
    pub fn raster_line(&self) -> u16 {
        self.raster_line
    }

    /// Line the raster interrupt fires on, from $D011 bit 7 and $D012.
    #[must_use]
    pub fn compare_line(&self) -> u16 {
        (u16::from(self.regs[0x11] & 0x80) << 1) | u16::from(self.regs[0x12])
    }

    /// Advance by `cycles` and return the interrupt output.
    pub fn advance(&mut self, cycles: u32) -> bool {
        let per_line = self.standard.cycles_per_line();
        self.line_cycles += cycles;
        while self.line_cycles >= per_line {
            self.line_cycles -= per_line;
            self.raster_line += 1;
            if self.raster_line >= self.standard.lines_per_frame() {
                self.raster_line = 0;
            }
            if self.regs[0x1A] & IRQ_RASTER != 0 && self.raster_line == self.compare_line() {
                self.irq_status |= IRQ_RASTER | IRQ_ANY;
            }
        }
        self.interrupt_active()
    }

    #[must_use]
    pub fn interrupt_active(&self) -> bool {
        self.irq_status & IRQ_ANY != 0
    }

    /// Clear the raster interrupt. Safe to repeat.
    pub fn acknowledge(&mut self) {
        self.irq_status &= !(IRQ_RASTER | IRQ_ANY);
    }

    /// Mark a raster interrupt as taken without running the raster, for
    /// frames that are simulated rather than timed.
    pub fn simulate_frame_irq(&mut self) {
        self.irq_status = IRQ_RASTER | IRQ_ANY;
    }

    #[must_use]
    pub fn read(&self, reg: u8) -> u8 {
        match reg & 0x3F {
            0x11 => (self.regs[0x11] & 0x7F) | (((self.raster_line >> 8) as u8) << 7),
            0x12 => self.raster_line as u8,
            0x19 => self.irq_status,
            reg => self.regs[usize::from(reg)],
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        let reg = reg & 0x3F;
        if reg == 0x19 {
            self.acknowledge();
            return;
        }
        self.regs[usize::from(reg)] = value;
    }
}

impl Default for Vic {
    fn default() -> Self {
        Self::new(VideoStandard::Pal)
    }
}

impl Observable for Vic {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "standard" => Some(
                match self.standard {
                    VideoStandard::Pal => "PAL",
                    VideoStandard::Ntsc => "NTSC",
                }
                .into(),
            ),
            "raster.line" => Some(self.raster_line.into()),
            "raster.cycle" => Some(self.line_cycles.into()),
            "raster.compare" => Some(self.compare_line().into()),
            "irq.status" => Some(self.irq_status.into()),
            "irq.enable" => Some(self.regs[0x1A].into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "standard",
            "raster.line",
            "raster.cycle",
            "raster.compare",
            "irq.status",
            "irq.enable",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_lengths() {
        assert_eq!(VideoStandard::Pal.cycles_per_frame(), 19656);
        assert_eq!(VideoStandard::Ntsc.cycles_per_frame(), 17095);
    }

    #[test]
    fn raster_wraps_after_one_frame() {
        for standard in [VideoStandard::Pal, VideoStandard::Ntsc] {
            let mut vic = Vic::new(standard);
            vic.advance(standard.cycles_per_line() * 5 + 3);
            let start = vic.raster_line();
            let mut remaining = standard.cycles_per_frame();
            while remaining > 0 {
                let step = remaining.min(7);
                vic.advance(step);
                remaining -= step;
            }
            assert_eq!(vic.raster_line(), start, "{standard:?}");
        }
    }

    #[test]
    fn raster_line_readable_through_registers() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.advance(63 * 0x137);
        assert_eq!(vic.read(0x12), 0x37);
        assert_eq!(vic.read(0x11) & 0x80, 0x80);
        // Mirrored every 64 bytes
        assert_eq!(vic.read(0x52), 0x37);
    }

    #[test]
    fn compare_match_raises_irq_only_when_enabled() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.write(0x12, 10);
        assert!(!vic.advance(63 * 10));
        assert_eq!(vic.read(0x19), 0);

        let mut vic = Vic::new(VideoStandard::Pal);
        vic.write(0x12, 10);
        vic.write(0x1A, IRQ_RASTER);
        assert!(!vic.advance(63 * 10 - 1));
        assert!(vic.advance(1));
        assert_eq!(vic.read(0x19), 0x81);
    }

    #[test]
    fn any_write_to_status_acknowledges() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.simulate_frame_irq();
        vic.write(0x19, 0x00);
        assert!(!vic.interrupt_active());
        vic.write(0x19, 0xFF);
        assert!(!vic.interrupt_active());
    }

    #[test]
    fn compare_line_uses_bit_8_from_d011() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.write(0x11, 0x8B);
        vic.write(0x12, 0x37);
        assert_eq!(vic.compare_line(), 0x137);
    }
}
