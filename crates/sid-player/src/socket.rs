//! Output device socket layout.
//!
//! The device carries two sockets. Each holds one chip, two chips (a dual
//! adapter), or nothing. Chips are addressed on the device by slot offsets
//! $00, $20, $40 and $60, handed out in socket order:
//!
//! | Socket 1 | Socket 2 | Slots                     |
//! |----------|----------|---------------------------|
//! | single   | off      | $00                       |
//! | dual     | off      | $00 $20                   |
//! | off      | single   | $00                       |
//! | off      | dual     | $00 $20                   |
//! | single   | single   | $00 / $20                 |
//! | single   | dual     | $00 / $20 $40             |
//! | dual     | single   | $00 $20 / $40             |
//! | dual     | dual     | $00 $20 / $40 $60         |

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One socket on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socket {
    pub enabled: bool,
    /// Holds a dual adapter with two chips.
    pub dual: bool,
}

impl Socket {
    pub const OFF: Socket = Socket {
        enabled: false,
        dual: false,
    };
    pub const SINGLE: Socket = Socket {
        enabled: true,
        dual: false,
    };
    pub const DUAL: Socket = Socket {
        enabled: true,
        dual: true,
    };

    const fn chips(self) -> u8 {
        match (self.enabled, self.dual) {
            (false, _) => 0,
            (true, false) => 1,
            (true, true) => 2,
        }
    }
}

/// Both sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketConfig {
    pub one: Socket,
    pub two: Socket,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            one: Socket::SINGLE,
            two: Socket::OFF,
        }
    }
}

impl SocketConfig {
    /// Named layouts, each with at least one chip.
    pub const PRESETS: [(&'static str, SocketConfig); 8] = [
        ("single", SocketConfig::new(Socket::SINGLE, Socket::OFF)),
        ("dual", SocketConfig::new(Socket::DUAL, Socket::OFF)),
        ("second-single", SocketConfig::new(Socket::OFF, Socket::SINGLE)),
        ("second-dual", SocketConfig::new(Socket::OFF, Socket::DUAL)),
        ("single-single", SocketConfig::new(Socket::SINGLE, Socket::SINGLE)),
        ("single-dual", SocketConfig::new(Socket::SINGLE, Socket::DUAL)),
        ("dual-single", SocketConfig::new(Socket::DUAL, Socket::SINGLE)),
        ("dual-dual", SocketConfig::new(Socket::DUAL, Socket::DUAL)),
    ];

    #[must_use]
    pub const fn new(one: Socket, two: Socket) -> Self {
        Self { one, two }
    }

    /// Look up a preset by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<SocketConfig> {
        Self::PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .map(|&(_, config)| config)
    }

    /// Device slot offsets: two per socket, `None` where no chip sits.
    #[must_use]
    pub fn slot_addresses(&self) -> [Option<u8>; 4] {
        let mut slots = [None; 4];
        let mut next = 0u8;
        for (socket, pair) in [self.one, self.two].into_iter().zip(slots.chunks_mut(2)) {
            for slot in pair.iter_mut().take(usize::from(socket.chips())) {
                *slot = Some(next * 0x20);
                next += 1;
            }
        }
        slots
    }

    /// Number of physical chips.
    #[must_use]
    pub fn chip_count(&self) -> usize {
        usize::from(self.one.chips() + self.two.chips())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chip_count() == 0 {
            return Err(ConfigError::InvalidChipCount);
        }
        Ok(())
    }

    /// Device address for `register` of tune chip `chip`, if that chip has
    /// a physical slot.
    #[must_use]
    pub fn device_address(&self, chip: u8, register: u8) -> Option<u8> {
        self.slot_addresses()
            .into_iter()
            .flatten()
            .nth(usize::from(chip))
            .map(|slot| slot | (register & 0x1F))
    }
}
