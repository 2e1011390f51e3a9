//! Turns stamped SID writes into timed commands for the output device.
//!
//! Simulated playback sends every write with the number of cycles since the
//! one before it, then pads each frame so that the delays in a frame add up
//! to the frame length. Authentic playback sends writes as they happen,
//! without delays, and drops writes that would not change a register.

use serde::Serialize;

use crate::sid::SidWrite;

/// Largest delay one command can carry.
pub const MAX_DELAY: u64 = 0xFFFF;

/// Which scheduling rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Simulated,
    Authentic,
}

/// One command for the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SidCommand {
    /// Wait `delay` cycles, then write.
    Write {
        chip: u8,
        register: u8,
        value: u8,
        delay: u16,
    },
    /// Wait without writing.
    Delay { cycles: u16 },
}

pub struct Scheduler {
    mode: PlaybackMode,
    /// Cycle of the last write, or of the last frame boundary.
    reference: u64,
    /// Delay sent so far in this frame.
    frame_write_cycles: u64,
    /// Last value sent per register offset.
    shadow: [u8; 0x20],
}

impl Scheduler {
    #[must_use]
    pub fn new(mode: PlaybackMode) -> Self {
        Self {
            mode,
            reference: 0,
            frame_write_cycles: 0,
            shadow: [0; 0x20],
        }
    }

    /// Start over at cycle `now`. The shadow returns to zero, matching a
    /// freshly reset chip.
    pub fn reset(&mut self, mode: PlaybackMode, now: u64) {
        *self = Self::new(mode);
        self.reference = now;
    }

    #[must_use]
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Cycles since the reference point, which then moves to `now`.
    ///
    /// A clock that went backwards resyncs with no delay. Gaps too large
    /// for one command are folded into range.
    pub fn delay_since(&mut self, now: u64) -> u16 {
        if now < self.reference {
            self.reference = now;
            return 0;
        }
        let mut delay = now - self.reference;
        if delay > MAX_DELAY {
            delay = (delay - 1) % MAX_DELAY + 1;
        }
        self.reference = now;
        delay as u16
    }

    /// Schedule one write. Returns `None` when the write is suppressed.
    pub fn on_write(&mut self, write: &SidWrite) -> Option<SidCommand> {
        match self.mode {
            PlaybackMode::Simulated => {
                let delay = self.delay_since(write.cycle);
                self.frame_write_cycles += u64::from(delay);
                Some(SidCommand::Write {
                    chip: write.chip,
                    register: write.register,
                    value: write.value,
                    delay,
                })
            }
            PlaybackMode::Authentic => {
                let slot = &mut self.shadow[usize::from(write.register & 0x1F)];
                if *slot == write.value {
                    return None;
                }
                *slot = write.value;
                Some(SidCommand::Write {
                    chip: write.chip,
                    register: write.register,
                    value: write.value,
                    delay: 0,
                })
            }
        }
    }

    /// Close a simulated frame of `frame_cycles` at cycle `now`, returning
    /// the padding needed to fill it.
    pub fn on_frame(&mut self, frame_cycles: u32, now: u64) -> Option<SidCommand> {
        let frame_cycles = u64::from(frame_cycles).min(MAX_DELAY);
        let written = std::mem::take(&mut self.frame_write_cycles);
        self.reference = now;
        let pad = frame_cycles.checked_sub(written)?;
        (pad > 0).then_some(SidCommand::Delay { cycles: pad as u16 })
    }
}
