//! Tunable parameters for the servo bank and the network clients.
//!
//! Defaults reproduce the constants the installation was calibrated with.
//! Every struct deserializes from JSON so the host app can override values
//! from a file.

extern crate alloc;

use alloc::{string::String, vec, vec::Vec};

use serde::{Deserialize, Serialize};

use crate::utils::math::motion::{Direction, DurationProfile};

/// Default I2C address of the PCA9685 board.
pub const PWM_ADDRESS: u8 = 0x40;
/// Prescale for a 50 Hz servo frame (25 MHz / (4096 * 50) - 1, truncated).
pub const PWM_PRESCALE_50HZ: u8 = 121;

/// PCA9685 off-tick values for an MG90S 360° servo.
///
/// Found by trial and error; other servos need their own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseTable {
    /// Stops the servo.
    pub neutral: u16,
    /// Slowest clockwise rotation.
    pub clockwise: u16,
    /// Slowest counterclockwise rotation.
    pub counterclockwise: u16,
}

impl Default for PulseTable {
    fn default() -> Self {
        Self {
            neutral: 325,
            clockwise: 305,
            counterclockwise: 336,
        }
    }
}

impl PulseTable {
    pub fn for_direction(
        &self,
        direction: Direction,
    ) -> u16 {
        match direction {
            Direction::Clockwise => self.clockwise,
            Direction::CounterClockwise => self.counterclockwise,
        }
    }
}

/// Servo bank configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub address: u8,
    pub prescale: u8,
    /// PCA9685 outputs (0..=15) with a servo attached, driven in this order.
    pub channels: Vec<u8>,
    pub pulses: PulseTable,
    pub profile: DurationProfile,
    /// Pause after each actuation cycle.
    pub settle_ms: u64,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            address: PWM_ADDRESS,
            prescale: PWM_PRESCALE_50HZ,
            channels: vec![0, 1, 2, 3, 4, 5],
            pulses: PulseTable::default(),
            profile: DurationProfile::default(),
            settle_ms: 1_000,
        }
    }
}

impl ServoConfig {
    /// Single servo on channel 0 turning for a fixed two seconds.
    pub fn sweep() -> Self {
        Self {
            channels: vec![0],
            profile: DurationProfile::Fixed { ms: 2_000 },
            ..Self::default()
        }
    }
}

/// Building API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Login endpoint receiving the credentials.
    pub login_url: String,
    /// Prefix of the room data endpoint, room id is appended verbatim.
    pub data_endpoint: String,
    pub room_id: String,
    pub username: String,
    pub password: String,
    /// JSON pointer to the reading inside the data response.
    pub reading_pointer: String,
    /// Offset from UTC used for the query time window.
    pub utc_offset_secs: i32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            login_url: String::new(),
            data_endpoint: String::new(),
            room_id: String::new(),
            username: String::new(),
            password: String::new(),
            reading_pointer: String::from("/0/value"),
            utc_offset_secs: 3_600,
        }
    }
}

/// Weather API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub url: String,
    pub pointer: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            url: String::from(
                "http://api.open-meteo.com/v1/forecast?latitude=52.37&longitude=4.89&current=temperature_2m",
            ),
            pointer: String::from("/current/temperature_2m"),
        }
    }
}
