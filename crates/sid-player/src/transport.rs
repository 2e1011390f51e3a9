//! Output side: where scheduled SID commands go.

use std::io::{self, Write};
use std::time::Duration;

use mos_vic_ii::VideoStandard;
use serde::Serialize;

use crate::pacing::Pacer;
use crate::scheduler::SidCommand;
use crate::socket::SocketConfig;

/// A device, or anything standing in for one, that accepts SID commands.
///
/// Delays are in machine cycles and come before the write they are sent
/// with.
pub trait Transport {
    fn write(&mut self, chip: u8, register: u8, value: u8, delay: u16);

    fn delay(&mut self, cycles: u16);

    /// Machine time that passed without a command to carry it. Authentic
    /// playback reports its cycles here, since its writes have no delays.
    fn elapse(&mut self, cycles: u32) {
        let _ = cycles;
    }

    /// Read a register back from the chip, where the link allows it.
    fn read(&mut self, chip: u8, register: u8) -> Option<u8> {
        let _ = (chip, register);
        None
    }

    /// Return all chips to their power-on state.
    fn reset(&mut self) {}

    fn mute(&mut self, muted: bool) {
        let _ = muted;
    }

    /// Clock the chips for this video standard.
    fn set_clock(&mut self, standard: VideoStandard) {
        let _ = standard;
    }

    /// Push out anything buffered.
    fn flush(&mut self) {}
}

impl SidCommand {
    pub fn send_to<T: Transport + ?Sized>(self, transport: &mut T) {
        match self {
            SidCommand::Write {
                chip,
                register,
                value,
                delay,
            } => transport.write(chip, register, value, delay),
            SidCommand::Delay { cycles } => transport.delay(cycles),
        }
    }
}

/// Keeps every command in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    pub commands: Vec<SidCommand>,
    /// Cycles reported through [`Transport::elapse`].
    pub elapsed: u64,
    pub muted: bool,
    pub resets: usize,
    pub standard: Option<VideoStandard>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded writes as `(chip, register, value)`.
    pub fn writes(&self) -> impl Iterator<Item = (u8, u8, u8)> + '_ {
        self.commands.iter().filter_map(|command| match *command {
            SidCommand::Write {
                chip,
                register,
                value,
                ..
            } => Some((chip, register, value)),
            SidCommand::Delay { .. } => None,
        })
    }

    /// Total cycles covered by the recorded delays and elapsed time.
    #[must_use]
    pub fn elapsed_cycles(&self) -> u64 {
        let delays: u64 = self
            .commands
            .iter()
            .map(|command| match *command {
                SidCommand::Write { delay, .. } => u64::from(delay),
                SidCommand::Delay { cycles } => u64::from(cycles),
            })
            .sum();
        delays + self.elapsed
    }
}

impl Transport for Recorder {
    fn write(&mut self, chip: u8, register: u8, value: u8, delay: u16) {
        self.commands.push(SidCommand::Write {
            chip,
            register,
            value,
            delay,
        });
    }

    fn delay(&mut self, cycles: u16) {
        self.commands.push(SidCommand::Delay { cycles });
    }

    fn elapse(&mut self, cycles: u32) {
        self.elapsed += u64::from(cycles);
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn mute(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_clock(&mut self, standard: VideoStandard) {
        self.standard = Some(standard);
    }
}

/// Line format of [`TextSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Event {
    Reset,
    Mute { muted: bool },
    Clock { hz: u32 },
}

/// Writes one line per command, with device addresses resolved through a
/// socket layout. Writes to chips with no slot are skipped.
///
/// The first I/O error stops output; [`TextSink::finish`] reports it.
pub struct TextSink<W: Write> {
    out: W,
    format: OutputFormat,
    sockets: SocketConfig,
    error: Option<io::Error>,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W, format: OutputFormat, sockets: SocketConfig) -> Self {
        Self {
            out,
            format,
            sockets,
            error: None,
        }
    }

    /// Flush and return the writer, or the first error seen.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, line: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = line(&mut self.out) {
            self.error = Some(e);
        }
    }

    fn emit_json<S: Serialize>(&mut self, value: &S) {
        self.emit(|out| {
            serde_json::to_writer(&mut *out, value)?;
            writeln!(out)
        });
    }

    fn emit_event(&mut self, event: &Event) {
        match self.format {
            OutputFormat::Json => self.emit_json(event),
            OutputFormat::Text => self.emit(|out| match event {
                Event::Reset => writeln!(out, "reset"),
                Event::Mute { muted } => {
                    writeln!(out, "mute {}", if *muted { "on" } else { "off" })
                }
                Event::Clock { hz } => writeln!(out, "clock {hz}"),
            }),
        }
    }
}

#[derive(Serialize)]
struct DeviceWrite {
    kind: &'static str,
    address: u8,
    chip: u8,
    register: u8,
    value: u8,
    delay: u16,
}

impl<W: Write> Transport for TextSink<W> {
    fn write(&mut self, chip: u8, register: u8, value: u8, delay: u16) {
        let Some(address) = self.sockets.device_address(chip, register) else {
            return;
        };
        match self.format {
            OutputFormat::Json => self.emit_json(&DeviceWrite {
                kind: "write",
                address,
                chip,
                register,
                value,
                delay,
            }),
            OutputFormat::Text => self.emit(|out| {
                writeln!(out, "{delay:>5} W ${address:02X} {value:02X}")
            }),
        }
    }

    fn delay(&mut self, cycles: u16) {
        match self.format {
            OutputFormat::Json => self.emit_json(&SidCommand::Delay { cycles }),
            OutputFormat::Text => self.emit(|out| writeln!(out, "{cycles:>5} D")),
        }
    }

    fn reset(&mut self) {
        self.emit_event(&Event::Reset);
    }

    fn mute(&mut self, muted: bool) {
        self.emit_event(&Event::Mute { muted });
    }

    fn set_clock(&mut self, standard: VideoStandard) {
        self.emit_event(&Event::Clock {
            hz: standard.cpu_clock(),
        });
    }

    fn flush(&mut self) {
        self.emit(|out| out.flush());
    }
}

/// Holds each command back until its delay has passed in real time.
pub struct Paced<T> {
    inner: T,
    pacer: Pacer,
}

impl<T: Transport> Paced<T> {
    pub fn new(inner: T, tolerance: Duration) -> Self {
        Self {
            inner,
            pacer: Pacer::new(VideoStandard::Pal.cpu_clock(), tolerance),
        }
    }

    #[must_use]
    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Transport> Transport for Paced<T> {
    fn write(&mut self, chip: u8, register: u8, value: u8, delay: u16) {
        self.pacer.wait_cycles(u32::from(delay));
        self.inner.write(chip, register, value, delay);
    }

    fn delay(&mut self, cycles: u16) {
        self.pacer.wait_cycles(u32::from(cycles));
        self.inner.delay(cycles);
    }

    fn elapse(&mut self, cycles: u32) {
        self.pacer.wait_cycles(cycles);
        self.inner.elapse(cycles);
    }

    fn read(&mut self, chip: u8, register: u8) -> Option<u8> {
        self.inner.read(chip, register)
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.pacer.resync();
    }

    fn mute(&mut self, muted: bool) {
        self.inner.mute(muted);
    }

    fn set_clock(&mut self, standard: VideoStandard) {
        self.pacer.set_clock(standard.cpu_clock());
        self.inner.set_clock(standard);
    }

    fn flush(&mut self) {
        self.inner.flush();
    }
}
