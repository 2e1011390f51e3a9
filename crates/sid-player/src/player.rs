//! Playback orchestration.
//!
//! A [`Player`] owns the whole machine. PSID tunes run simulated: init is
//! called once, then play is called as a subroutine once per frame, and the
//! interrupt chips are not clocked. RSID tunes run authentic: the CIAs and
//! VIC-II are clocked every instruction and the tune's own interrupt
//! handlers do the playing.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use emu_core::{Cpu, Interrupt, Observable, Value};
use format_sid::{Channel, ChipSpec, HeaderLayout, SidModel, SidTune, TuneFormat};
use mos_6502::{Mos6502, ROUTINE_STACK, flags, is_finished};
use mos_vic_ii::VideoStandard;

use crate::bus::{DEFAULT_CIA_LATCH, PlayerBus};
use crate::scheduler::{PlaybackMode, Scheduler};
use crate::sid::SidMap;
use crate::transport::Transport;
use crate::{PlayerConfig, PlayerError};

/// Cycles charged for the instruction that finished a routine.
const RETURN_CYCLES: u32 = 6;
/// Cycles charged per step while a finished routine waits.
const IDLE_CYCLES: u32 = 7;
const MAX_PLAY_SECONDS: u32 = 3600;
/// Interrupt status forced on CIA 1 before a timer-driven play call.
const SIMULATED_CIA_FLAGS: u8 = 0x83;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Idle,
    RunningSimulated,
    RunningAuthentic,
}

/// What sets the frame length of simulated playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTiming {
    /// One video frame.
    Raster,
    /// CIA 1 timer A period.
    CiaTimer,
}

/// A change queued for the next step boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Load a tune file and start its default subtune.
    Load(Vec<u8>),
    Subtune(u16),
    Next,
    Previous,
    Stop,
}

/// Summary of a loaded tune.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuneInfo {
    pub format: TuneFormat,
    pub version: u16,
    pub layout: HeaderLayout,
    pub title: String,
    pub author: String,
    pub released: String,
    pub load_address: u16,
    pub end_address: u16,
    pub init_address: u16,
    /// Zero when the tune plays from an interrupt vector.
    pub play_address: u16,
    pub subtunes: u16,
    pub start_subtune: u16,
    pub speed: u32,
    pub standard: VideoStandard,
    pub chips: [ChipSpec; 4],
    pub digi: bool,
}

impl TuneInfo {
    #[must_use]
    pub fn new(tune: &SidTune) -> Self {
        let header = &tune.header;
        Self {
            format: header.format,
            version: header.version,
            layout: header.layout(),
            title: header.title.clone(),
            author: header.author.clone(),
            released: header.released.clone(),
            load_address: tune.load_address,
            end_address: tune.end_address(),
            init_address: tune.init_address(),
            play_address: header.play_address,
            subtunes: header.subtune_count(),
            start_subtune: header.start_song.clamp(1, header.subtune_count()),
            speed: header.speed,
            standard: standard_for(tune),
            chips: header.chips(),
            digi: header.needs_digi(),
        }
    }
}

impl fmt::Display for TuneInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magic = match self.format {
            TuneFormat::Psid => "PSID",
            TuneFormat::Rsid => "RSID",
        };
        writeln!(f, "Title:     {}", self.title)?;
        writeln!(f, "Author:    {}", self.author)?;
        writeln!(f, "Released:  {}", self.released)?;
        write!(f, "Format:    {magic} v{}", self.version)?;
        if self.layout == HeaderLayout::MultiSid {
            write!(f, " (multi-SID)")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Load:      ${:04X}-${:04X}",
            self.load_address, self.end_address
        )?;
        writeln!(f, "Init:      ${:04X}", self.init_address)?;
        if self.play_address == 0 {
            writeln!(f, "Play:      interrupt")?;
        } else {
            writeln!(f, "Play:      ${:04X}", self.play_address)?;
        }
        writeln!(
            f,
            "Subtunes:  {} (start {}), speed ${:08X}",
            self.subtunes, self.start_subtune, self.speed
        )?;
        writeln!(
            f,
            "Clock:     {}",
            match self.standard {
                VideoStandard::Pal => "PAL",
                VideoStandard::Ntsc => "NTSC",
            }
        )?;
        for (index, chip) in self.chips.iter().enumerate() {
            let Some(base) = chip.base else { continue };
            let model = match chip.model {
                SidModel::Mos6581 => "6581",
                SidModel::Mos8580 => "8580",
            };
            let channel = match chip.channel {
                Channel::Left => "left",
                Channel::Right => "right",
                Channel::Both => "both",
            };
            writeln!(f, "SID {}:     ${base:04X} {model} {channel}", index + 1)?;
        }
        write!(f, "Digi:      {}", if self.digi { "yes" } else { "no" })
    }
}

fn standard_for(tune: &SidTune) -> VideoStandard {
    if tune.header.clock().is_ntsc() {
        VideoStandard::Ntsc
    } else {
        VideoStandard::Pal
    }
}

/// Bank setting for init: BASIC ROM out when init or the image touches
/// $A000-$BFFF, KERNAL out when they reach $E000.
fn init_bank(init: u16, load: u16, end: u16) -> u8 {
    if (0xA000..0xC000).contains(&init) || (load < 0xC000 && end >= 0xA000) {
        0x36
    } else if init >= 0xE000 || end >= 0xE000 {
        0x35
    } else {
        0x37
    }
}

/// Playback position within the current subtune.
struct Cursor {
    subtune: u16,
    standard: VideoStandard,
    finished: bool,
    timing: FrameTiming,
    frame_cycles: u32,
    frame_counter: u32,
    frames: u64,
    play_address: Option<u16>,
    /// Stack pointer a play call starts with.
    play_stack: u8,
    /// Cycles per output sample, 4 fractional bits.
    cycles_per_sample: i64,
    /// Cycles still owed to the current sample, 4 fractional bits.
    sample_debt: i64,
    samples_to_tod: u32,
    samples_to_second: u32,
    play_seconds: u32,
}

impl Cursor {
    fn new(subtune: u16, standard: VideoStandard, sample_rate: u32) -> Self {
        Self {
            subtune,
            standard,
            finished: false,
            timing: FrameTiming::Raster,
            frame_cycles: standard.cycles_per_frame(),
            frame_counter: 0,
            frames: 0,
            play_address: None,
            play_stack: ROUTINE_STACK,
            cycles_per_sample: (i64::from(standard.cpu_clock()) << 4)
                / i64::from(sample_rate.max(1)),
            sample_debt: 0,
            samples_to_tod: 0,
            samples_to_second: 0,
            play_seconds: 0,
        }
    }
}

/// The playback machine, sending SID writes to `T`.
pub struct Player<T: Transport> {
    config: PlayerConfig,
    cpu: Mos6502,
    bus: PlayerBus,
    scheduler: Scheduler,
    transport: T,
    tune: Option<SidTune>,
    state: PlayState,
    cursor: Cursor,
    /// Machine cycles since the player was created.
    cycles: u64,
    /// Subtunes whose init never returned.
    broken: Vec<u16>,
    requests: Receiver<Request>,
    controller: Sender<Request>,
}

impl<T: Transport> Player<T> {
    pub fn new(config: PlayerConfig, transport: T) -> Self {
        let config = config.sanitized();
        let (controller, requests) = mpsc::channel();
        Self {
            cursor: Cursor::new(0, VideoStandard::Pal, config.sample_rate),
            config,
            cpu: Mos6502::new(),
            bus: PlayerBus::new(),
            scheduler: Scheduler::new(PlaybackMode::Simulated),
            transport,
            tune: None,
            state: PlayState::Idle,
            cycles: 0,
            broken: Vec::new(),
            requests,
            controller,
        }
    }

    /// Parse and install a tune file. Playback stops until a subtune is
    /// started. On error the previous tune stays loaded.
    pub fn load(&mut self, data: &[u8]) -> Result<TuneInfo, PlayerError> {
        let tune = SidTune::parse(data)?;
        if tune.is_truncated() {
            log::warn!(
                "tune image at ${:04X} runs past $FFFF, {} bytes dropped",
                tune.load_address,
                usize::from(tune.load_address) + tune.payload.len() - 0x1_0000
            );
        }
        let info = TuneInfo::new(&tune);
        log::info!("loaded tune\n{info}");

        self.stop();
        self.bus.reset(info.standard, info.format);
        self.bus.memory.load(tune.load_address, &tune.payload);
        self.tune = Some(tune);
        self.broken.clear();
        self.cursor = Cursor::new(0, info.standard, self.config.sample_rate);
        Ok(info)
    }

    /// Start subtune `subtune` (1-based, clamped to the tune's range) from
    /// a freshly reset machine.
    pub fn init_subtune(&mut self, subtune: u16) -> Result<(), PlayerError> {
        let tune = self.tune.as_ref().ok_or(PlayerError::NoTune)?;
        let header = &tune.header;
        let subtune = subtune.clamp(1, header.subtune_count());
        let format = header.format;
        let standard = standard_for(tune);
        let init = tune.init_address();
        let header_play = header.play_address;
        let cia_flagged = header.uses_cia_timer(subtune);
        let sids = SidMap::for_tune(header, self.config.chip_limit(), self.config.forced_model);

        self.transport.mute(true);
        self.transport.reset();
        self.transport.set_clock(standard);

        self.bus.reset(standard, format);
        self.bus.memory.load(tune.load_address, &tune.payload);
        let bank = init_bank(init, tune.load_address, tune.end_address());
        self.bus.memory.set_bank(bank);
        self.bus.sids = sids;
        self.bus.clock = self.cycles;

        self.cursor = Cursor::new(subtune, standard, self.config.sample_rate);
        self.cpu.init(init);
        self.cpu.regs.a = (subtune - 1) as u8;
        log::info!(
            "subtune {subtune}/{}: init ${init:04X}, bank ${bank:02X}",
            header.subtune_count()
        );

        match format {
            TuneFormat::Psid => {
                self.scheduler.reset(PlaybackMode::Simulated, self.cycles);
                self.state = PlayState::RunningSimulated;
                if let Err(e) = self.run_init(subtune) {
                    log::warn!("{e}");
                    self.state = PlayState::Idle;
                    if !self.broken.contains(&subtune) {
                        self.broken.push(subtune);
                    }
                    return Err(e);
                }
                self.configure_frames(cia_flagged);
                self.resolve_play_address(header_play);
                self.cursor.finished = true;
            }
            TuneFormat::Rsid => {
                self.scheduler.reset(PlaybackMode::Authentic, self.cycles);
                self.state = PlayState::RunningAuthentic;
            }
        }

        self.transport.mute(false);
        Ok(())
    }

    /// Run a PSID init routine to completion.
    ///
    /// The raster keeps moving and timer A drifts so that init code waiting
    /// on either gets out.
    fn run_init(&mut self, subtune: u16) -> Result<(), PlayerError> {
        let budget = self.config.init_budget;
        for _ in 0..budget {
            self.bus.clock = self.cycles;
            let cycles = self.cpu.step(&mut self.bus);
            if is_finished(cycles) {
                self.dispatch_writes();
                return Ok(());
            }
            self.cycles += u64::from(cycles);
            self.bus.vic.advance(cycles);
            self.bus.cia1.drift_timer_a(cycles);
            self.dispatch_writes();
        }
        Err(PlayerError::InitTimeout { subtune, budget })
    }

    fn configure_frames(&mut self, cia_flagged: bool) {
        let latch = self.bus.cia1.timer_a_latch();
        if cia_flagged || latch != DEFAULT_CIA_LATCH {
            self.cursor.timing = FrameTiming::CiaTimer;
            self.cursor.frame_cycles = u32::from(latch.max(1));
        } else {
            self.cursor.timing = FrameTiming::Raster;
            self.cursor.frame_cycles = self.cursor.standard.cycles_per_frame();
        }
        log::debug!(
            "{:?} timing, {} cycles per frame",
            self.cursor.timing,
            self.cursor.frame_cycles
        );
    }

    /// Work out where play calls start.
    ///
    /// A header play address is called as a subroutine, with ROM banked out
    /// if it lies under one. Otherwise the tune installed an interrupt
    /// handler during init: the hardware vector at $FFFE when the KERNAL is
    /// out, else the KERNAL vector at $0314. KERNAL handlers pull three
    /// saved registers before returning, so those calls start with three
    /// bytes on the stack.
    fn resolve_play_address(&mut self, header_play: u16) {
        let memory = &mut self.bus.memory;
        let (play, stack) = if header_play != 0 {
            if memory.bank() == 0x37 {
                if (0xA000..0xC000).contains(&header_play) {
                    memory.set_bank(0x36);
                } else if header_play >= 0xE000 {
                    memory.set_bank(0x35);
                }
            } else if header_play >= 0xE000 {
                memory.set_bank(0x35);
            }
            (header_play, ROUTINE_STACK)
        } else if memory.bank() & 0x03 < 2 {
            (memory.ram_word(0xFFFE), ROUTINE_STACK)
        } else {
            (memory.ram_word(0x0314), 0xFC)
        };

        self.cursor.play_stack = stack;
        self.cursor.play_address = (play != 0).then_some(play);
        match self.cursor.play_address {
            Some(play) => log::debug!("play ${play:04X}"),
            None => log::info!("no play routine, subtune stays silent"),
        }
    }

    fn prime_play(&mut self, play: u16) {
        self.cpu.init(play);
        self.cpu.regs.s = self.cursor.play_stack;
        self.cursor.finished = false;
    }

    /// Stop playback and silence the output. The tune stays loaded.
    pub fn stop(&mut self) {
        if self.state != PlayState::Idle {
            log::info!("playback stopped");
        }
        self.state = PlayState::Idle;
        self.transport.mute(true);
    }

    /// Start the following subtune, wrapping to the first.
    pub fn next_subtune(&mut self) -> Result<u16, PlayerError> {
        let count = self.subtune_count().ok_or(PlayerError::NoTune)?;
        let next = if self.cursor.subtune >= count {
            1
        } else {
            self.cursor.subtune + 1
        };
        self.init_subtune(next)?;
        Ok(next)
    }

    /// Start the preceding subtune, wrapping to the last.
    pub fn previous_subtune(&mut self) -> Result<u16, PlayerError> {
        let count = self.subtune_count().ok_or(PlayerError::NoTune)?;
        let previous = if self.cursor.subtune <= 1 {
            count
        } else {
            self.cursor.subtune - 1
        };
        self.init_subtune(previous)?;
        Ok(previous)
    }

    /// Queue a change for the next step boundary.
    pub fn request(&self, request: Request) {
        // The receiver lives as long as `self`.
        let _ = self.controller.send(request);
    }

    /// A handle for queueing requests from another thread.
    #[must_use]
    pub fn controller(&self) -> Sender<Request> {
        self.controller.clone()
    }

    fn apply_requests(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            let result = match request {
                Request::Load(data) => self.load(&data).and_then(|info| {
                    self.init_subtune(info.start_subtune)
                }),
                Request::Subtune(subtune) => self.init_subtune(subtune),
                Request::Next => self.next_subtune().map(drop),
                Request::Previous => self.previous_subtune().map(drop),
                Request::Stop => {
                    self.stop();
                    Ok(())
                }
            };
            if let Err(e) = result {
                log::warn!("request failed: {e}");
            }
        }
    }

    /// Run one step: an instruction, an interrupt entry, an idle slot, or a
    /// frame boundary. Returns the machine cycles it took.
    pub fn step(&mut self) -> u32 {
        self.apply_requests();
        let cycles = match self.state {
            PlayState::Idle => 0,
            PlayState::RunningSimulated => self.step_simulated(),
            PlayState::RunningAuthentic => self.step_authentic(),
        };
        self.dispatch_writes();
        cycles
    }

    fn step_simulated(&mut self) -> u32 {
        if self.cursor.frame_counter >= self.cursor.frame_cycles {
            self.frame_boundary();
            return 0;
        }
        let cycles = self.execute();
        self.cursor.frame_counter += cycles;
        self.bus.cia1.drift_timer_a(cycles);
        cycles
    }

    fn frame_boundary(&mut self) {
        if let Some(padding) = self.scheduler.on_frame(self.cursor.frame_cycles, self.cycles) {
            padding.send_to(&mut self.transport);
        }
        self.cursor.frame_counter -= self.cursor.frame_cycles;
        self.cursor.frames += 1;

        if self.cursor.finished
            && let Some(play) = self.cursor.play_address
        {
            self.prime_play(play);
            match self.cursor.timing {
                FrameTiming::Raster => self.bus.vic.simulate_frame_irq(),
                FrameTiming::CiaTimer => self.bus.cia1.force_interrupt_flags(SIMULATED_CIA_FLAGS),
            }
        }
    }

    fn step_authentic(&mut self) -> u32 {
        self.bus.clock = self.cycles;
        let cycles = if let Some(cycles) = self.cpu.service_interrupt(&mut self.bus) {
            self.cursor.finished = false;
            self.cycles += u64::from(cycles);
            cycles
        } else {
            self.execute()
        };

        let irq = self.bus.cia1.advance(cycles) | self.bus.vic.advance(cycles);
        let nmi = self.bus.cia2.advance(cycles);
        self.cpu.set_interrupt_line(Interrupt::Irq, irq);
        self.cpu.set_interrupt_line(Interrupt::Nmi, nmi);
        cycles
    }

    /// Execute one instruction, or idle if the routine has returned.
    fn execute(&mut self) -> u32 {
        let cycles = if self.cursor.finished {
            IDLE_CYCLES
        } else {
            self.bus.clock = self.cycles;
            let cycles = self.cpu.step(&mut self.bus);
            if is_finished(cycles) {
                self.cursor.finished = true;
                if self.state == PlayState::RunningAuthentic {
                    // Back in the idle loop with interrupts enabled
                    self.cpu.regs.p.set_if(flags::I, false);
                }
                RETURN_CYCLES
            } else {
                cycles
            }
        };
        self.cycles += u64::from(cycles);
        cycles
    }

    fn dispatch_writes(&mut self) {
        for write in self.bus.pending.drain(..) {
            if let Some(command) = self.scheduler.on_write(&write) {
                command.send_to(&mut self.transport);
            }
        }
    }

    /// Run for one output sample period, then advance the time-of-day
    /// clock and play time. Returns the cycles run.
    ///
    /// Cycles run authentically are passed to [`Transport::elapse`], as no
    /// write delay accounts for them.
    pub fn run_sample(&mut self) -> u32 {
        self.cursor.sample_debt += self.cursor.cycles_per_sample;
        let mut consumed = 0;
        let mut unscheduled = 0;
        while self.cursor.sample_debt > 0 {
            let cycles = self.step();
            match self.state {
                PlayState::Idle => {
                    self.cursor.sample_debt = 0;
                    return consumed;
                }
                PlayState::RunningAuthentic => unscheduled += cycles,
                PlayState::RunningSimulated => {}
            }
            consumed += cycles;
            self.cursor.sample_debt -= i64::from(cycles) << 4;
        }
        if unscheduled > 0 {
            self.transport.elapse(unscheduled);
        }
        self.tick_sample();
        consumed
    }

    fn tick_sample(&mut self) {
        let rate = self.config.sample_rate;
        self.cursor.samples_to_tod += 1;
        if self.cursor.samples_to_tod >= (rate / 10).max(1) {
            self.cursor.samples_to_tod = 0;
            self.bus.cia1.tick_tod();
        }
        self.cursor.samples_to_second += 1;
        if self.cursor.samples_to_second >= rate {
            self.cursor.samples_to_second = 0;
            self.cursor.play_seconds = (self.cursor.play_seconds + 1).min(MAX_PLAY_SECONDS);
        }
    }

    /// Run whole samples until at least `cycles` have passed or playback
    /// stops.
    pub fn run_cycles(&mut self, cycles: u64) -> u64 {
        let mut consumed = 0;
        while consumed < cycles {
            consumed += u64::from(self.run_sample());
            if self.state == PlayState::Idle {
                break;
            }
        }
        consumed
    }

    /// Run for one frame of the current subtune.
    pub fn run_frame(&mut self) -> u64 {
        self.run_cycles(u64::from(self.cursor.frame_cycles))
    }

    #[must_use]
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Current subtune, 0 before any has been started.
    #[must_use]
    pub fn subtune(&self) -> u16 {
        self.cursor.subtune
    }

    #[must_use]
    pub fn subtune_count(&self) -> Option<u16> {
        self.tune.as_ref().map(|tune| tune.header.subtune_count())
    }

    /// Whether init of `subtune` ran out of budget.
    #[must_use]
    pub fn is_broken(&self, subtune: u16) -> bool {
        self.broken.contains(&subtune)
    }

    /// Seconds played in this subtune, up to an hour.
    #[must_use]
    pub fn play_time(&self) -> u32 {
        self.cursor.play_seconds
    }

    #[must_use]
    pub fn timing(&self) -> FrameTiming {
        self.cursor.timing
    }

    #[must_use]
    pub fn frame_cycles(&self) -> u32 {
        self.cursor.frame_cycles
    }

    /// CPU clock of the current tune in Hz.
    #[must_use]
    pub fn clock_hz(&self) -> u32 {
        self.cursor.standard.cpu_clock()
    }

    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    #[must_use]
    pub fn sid_map(&self) -> &SidMap {
        &self.bus.sids
    }

    #[must_use]
    pub fn tune_info(&self) -> Option<TuneInfo> {
        self.tune.as_ref().map(TuneInfo::new)
    }

    #[must_use]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T: Transport> Observable for Player<T> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            return self.cpu.query(rest);
        }
        if let Some(rest) = path.strip_prefix("cia1.") {
            return self.bus.cia1.query(rest);
        }
        if let Some(rest) = path.strip_prefix("cia2.") {
            return self.bus.cia2.query(rest);
        }
        if let Some(rest) = path.strip_prefix("vic.") {
            return self.bus.vic.query(rest);
        }
        if let Some(address) = path.strip_prefix("ram.") {
            let address = u16::from_str_radix(address.trim_start_matches('$'), 16).ok()?;
            return Some(self.bus.memory.ram(address).into());
        }
        match path {
            "state" => Some(
                match self.state {
                    PlayState::Idle => "idle",
                    PlayState::RunningSimulated => "simulated",
                    PlayState::RunningAuthentic => "authentic",
                }
                .into(),
            ),
            "subtune" => Some(self.cursor.subtune.into()),
            "finished" => Some(self.cursor.finished.into()),
            "bank" => Some(self.bus.memory.bank().into()),
            "frame.cycles" => Some(self.cursor.frame_cycles.into()),
            "frame.counter" => Some(self.cursor.frame_counter.into()),
            "frames" => Some(self.cursor.frames.into()),
            "play_time" => Some(self.cursor.play_seconds.into()),
            "cycles" => Some(self.cycles.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "state",
            "subtune",
            "finished",
            "bank",
            "frame.cycles",
            "frame.counter",
            "frames",
            "play_time",
            "cycles",
            "ram.<addr>",
            "cpu.<path>",
            "cia1.<path>",
            "cia2.<path>",
            "vic.<path>",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_bank_follows_image_range() {
        assert_eq!(init_bank(0x1000, 0x1000, 0x1FFF), 0x37);
        assert_eq!(init_bank(0xA000, 0x1000, 0x1FFF), 0x36);
        assert_eq!(init_bank(0x1000, 0x1000, 0xA100), 0x36);
        assert_eq!(init_bank(0xE000, 0xC000, 0xE100), 0x35);
        assert_eq!(init_bank(0xC000, 0xC000, 0xF000), 0x35);
        assert_eq!(init_bank(0xC000, 0xC000, 0xCFFF), 0x37);
    }

    #[test]
    fn sample_period_in_fixed_point() {
        let cursor = Cursor::new(1, VideoStandard::Pal, 44_100);
        assert_eq!(cursor.cycles_per_sample >> 4, 22);
        assert_eq!(cursor.cycles_per_sample, (985_248 << 4) / 44_100);
    }
}
