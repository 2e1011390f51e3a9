//! Command-line SID player.
//!
//! Usage: sid-player <tune.sid> [--subtune N] [--seconds S] [--config FILE]
//!        [--format text|json] [--realtime] [--info] [-v]
//!
//! Commands for the output device are written to stdout, one per line.

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use format_sid::SidTune;
use sid_player::{
    OutputFormat, Paced, Player, PlayerConfig, PlayerError, TextSink, Transport, TuneInfo,
};

#[derive(Parser)]
#[command(name = "sid-player", about = "Play PSID/RSID tunes on real SID chips")]
struct Args {
    /// Tune file
    file: PathBuf,

    /// Subtune to play (defaults to the tune's start subtune)
    #[arg(short, long)]
    subtune: Option<u16>,

    /// Seconds of playback
    #[arg(long, default_value_t = 60)]
    seconds: u32,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output line format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Hold each command until its time has come
    #[arg(long)]
    realtime: bool,

    /// Print tune information and exit
    #[arg(long)]
    info: bool,

    /// More logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn play<T: Transport>(
    transport: T,
    config: PlayerConfig,
    data: &[u8],
    args: &Args,
) -> Result<T, PlayerError> {
    let mut player = Player::new(config, transport);
    let info = player.load(data)?;
    player.init_subtune(args.subtune.unwrap_or(info.start_subtune))?;

    let cycles = u64::from(args.seconds) * u64::from(player.clock_hz());
    player.run_cycles(cycles);
    log::info!("played {} s of subtune {}", player.play_time(), player.subtune());

    player.stop();
    player.transport_mut().flush();
    Ok(player.into_transport())
}

fn run(args: &Args) -> Result<(), PlayerError> {
    let data = std::fs::read(&args.file)?;
    if args.info {
        println!("{}", TuneInfo::new(&SidTune::parse(&data)?));
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    let sink = TextSink::new(
        BufWriter::new(io::stdout().lock()),
        args.format.into(),
        config.sockets,
    );

    let sink = if args.realtime {
        let tolerance = Duration::from_micros(config.desync_tolerance_us);
        let paced = play(Paced::new(sink, tolerance), config, &data, args)?;
        if paced.pacer().desyncs() > 0 {
            log::warn!("fell behind {} time(s)", paced.pacer().desyncs());
        }
        paced.into_inner()
    } else {
        play(sink, config, &data, args)?
    };
    sink.finish()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sid-player: {e}");
            ExitCode::FAILURE
        }
    }
}
