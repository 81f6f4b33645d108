//! Module Exports
//!
//! Hardware-facing controllers of the installation.
//!
//! - `servo`: continuous servos behind a PCA9685 on the I2C bus
//! - `blink`: single heartbeat LED

extern crate alloc;

pub mod blink;
pub mod servo;

use alloc::string::String;
use core::cell::RefCell;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embedded_hal::delay::DelayNs;

pub use blink::Blinker;
pub use servo::{ActuatorState, DeviceError, ServoBank};

use crate::utils::{
    config::ServoConfig,
    math::motion::MotionPlan,
    sources::{serial::parse_co2_line, ReadingTracker, SourceError},
};

/// Text lines from the gateway, standing in for the UART link.
pub static UART_CHANNEL: Channel<CriticalSectionRawMutex, String, 4> = Channel::new();

/// Turns readings into servo motion.
pub struct BluebirdController<'a, I2C: 'static> {
    pub servos: Option<ServoBank<'a, I2C>>,
    tracker: ReadingTracker,
}

impl<'a, I2C> BluebirdController<'a, I2C>
where
    I2C: embedded_hal::i2c::I2c + 'static,
{
    /// Bring up the PWM board and park every servo.
    ///
    /// When the board does not answer, the bus is scanned for diagnostics and
    /// the controller keeps tracking readings without moving anything.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        config: ServoConfig,
    ) -> Self {
        let mut bank = ServoBank::new(i2c_bus, config);

        let servos = match Self::bring_up(&mut bank) {
            Ok(()) => Some(bank),
            Err(e) => {
                tracing::warn!("PWM init failed, scanning instead: {:?}", e);
                bank.scan_bus();
                None
            }
        };

        BluebirdController {
            servos,
            tracker: ReadingTracker::new(),
        }
    }

    fn bring_up(bank: &mut ServoBank<'a, I2C>) -> Result<(), DeviceError<I2C::Error>> {
        bank.init_devices()?;
        bank.configure_pwm()?;
        bank.stop_all()
    }

    /// Wrap an already configured bank.
    pub fn with_bank(bank: ServoBank<'a, I2C>) -> Self {
        BluebirdController {
            servos: Some(bank),
            tracker: ReadingTracker::new(),
        }
    }

    pub fn tracker(&self) -> &ReadingTracker {
        &self.tracker
    }

    /// Record a sample and move the servos by its delta.
    ///
    /// A failed sample or the very first reading leaves the servos alone.
    pub fn handle_reading<D: DelayNs>(
        &mut self,
        sample: Result<f32, SourceError>,
        delay: &mut D,
    ) -> Option<MotionPlan> {
        let delta = self.tracker.apply(sample)?;

        let Some(bank) = self.servos.as_mut() else {
            tracing::warn!(delta, "reading received but servos not initialized");
            return None;
        };

        let settle_ms = bank.config().settle_ms;
        let plan = match bank.actuate(delta, delay) {
            Ok(plan) => Some(plan),
            Err(e) => {
                // The bank has already parked whatever it could.
                tracing::error!("actuation failed: {}", e);
                None
            }
        };
        delay.delay_ms(settle_ms.min(u32::MAX as u64) as u32);
        plan
    }

    /// Parse a forwarded serial line and act on it.
    pub fn handle_line<D: DelayNs>(
        &mut self,
        line: &str,
        delay: &mut D,
    ) -> Option<MotionPlan> {
        tracing::info!("Received: {}", line);
        self.handle_reading(parse_co2_line(line), delay)
    }

    pub async fn uart_ch<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> ! {
        loop {
            let line = UART_CHANNEL.receiver().receive().await;
            self.handle_line(&line, delay);
        }
    }
}
