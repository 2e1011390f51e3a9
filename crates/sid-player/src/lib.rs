//! SID tune player for real SID chips.
//!
//! Runs the machine code inside a PSID or RSID file on an emulated C64
//! (6510 CPU, two CIAs, VIC-II raster) and turns its SID register writes
//! into a timed command stream for an output device with up to four chips.
//!
//! ```text
//! SidTune ─► Player ─► PlayerBus ─► SidMap ─► Scheduler ─► Transport
//!             │  CPU     memory, CIA1/2, VIC-II
//! ```

mod bus;
mod config;
mod error;
pub mod memory;
mod pacing;
mod player;
mod scheduler;
mod sid;
mod socket;
mod transport;

pub use bus::{DEFAULT_CIA_LATCH, PlayerBus};
pub use config::PlayerConfig;
pub use emu_core::{Observable, Value};
pub use error::{ConfigError, PlayerError};
pub use mos_vic_ii::VideoStandard;
pub use pacing::Pacer;
pub use player::{FrameTiming, PlayState, Player, Request, TuneInfo};
pub use scheduler::{MAX_DELAY, PlaybackMode, Scheduler, SidCommand};
pub use sid::{CHIP_SPAN, SidMap, SidWrite, WINDOW_END, WINDOW_START};
pub use socket::{Socket, SocketConfig};
pub use transport::{OutputFormat, Paced, Recorder, TextSink, Transport};
