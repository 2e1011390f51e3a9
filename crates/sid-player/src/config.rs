//! Player settings, loaded from JSON.

use std::path::Path;

use format_sid::SidModel;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, PlayerError, SocketConfig};

/// Tunable player settings. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Output sample rate in Hz. Sets the step granularity of
    /// [`crate::Player::run_sample`] and the TOD tick rate.
    pub sample_rate: u32,
    /// Instructions a PSID init routine may execute before it is abandoned.
    pub init_budget: u64,
    pub sockets: SocketConfig,
    /// Play every chip as this model, ignoring the tune header.
    pub forced_model: Option<SidModel>,
    /// How far wall-clock time may lag before pacing gives up and resyncs.
    pub desync_tolerance_us: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            init_budget: 10_000_000,
            sockets: SocketConfig::default(),
            forced_model: None,
            desync_tolerance_us: 5_000,
        }
    }
}

impl PlayerConfig {
    pub fn from_json(text: &str) -> Result<Self, PlayerError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlayerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        self.sockets.validate()
    }

    /// Replace unusable settings with defaults, logging each one.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.sample_rate == 0 {
            log::warn!("{}; using {} Hz", ConfigError::ZeroSampleRate, defaults.sample_rate);
            self.sample_rate = defaults.sample_rate;
        }
        if let Err(e) = self.sockets.validate() {
            log::warn!("{e}; using a single chip");
            self.sockets = defaults.sockets;
        }
        self
    }

    /// Physical chips available on the device.
    #[must_use]
    pub fn chip_limit(&self) -> usize {
        self.sockets.chip_count().clamp(1, 4)
    }
}
