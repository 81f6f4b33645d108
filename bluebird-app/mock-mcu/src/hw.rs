//! Hardware stand-ins that print what the board would do.

use std::{
    convert::Infallible,
    time::{SystemTime, UNIX_EPOCH},
};

use bluebird_core::utils::schedule::WallClock;
use embedded_hal::{
    digital::{ErrorType as PinErrorType, OutputPin},
    i2c::{ErrorType as I2cErrorType, I2c, Operation, SevenBitAddress},
};
use tracing::{debug, info};

/// First PCA9685 output register (LED0_ON_L).
const LED0_ON_L: u8 = 0x06;

/// I2C bus that accepts every transfer and logs PCA9685 output writes.
#[derive(Default)]
pub struct LoggingPwmBus;

impl I2cErrorType for LoggingPwmBus {
    type Error = Infallible;
}

impl I2c<SevenBitAddress> for LoggingPwmBus {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => log_write(address, *bytes),
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

fn log_write(
    address: u8,
    bytes: &[u8],
) {
    match bytes {
        [reg, _, _, off_l, off_h] if (LED0_ON_L..LED0_ON_L + 64).contains(reg) => {
            let channel = (reg - LED0_ON_L) / 4;
            let off = u16::from_le_bytes([*off_l, *off_h]);
            info!(channel, off, "PWM");
        }
        _ => debug!("I2C 0x{:02X} <- {:02X?}", address, bytes),
    }
}

/// The on-board LED.
#[derive(Default)]
pub struct LoggingLed;

impl PinErrorType for LoggingLed {
    type Error = Infallible;
}

impl OutputPin for LoggingLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        info!("LED off");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        info!("LED on");
        Ok(())
    }
}

/// Host clock in place of NTP.
pub struct SystemClock;

impl WallClock for SystemClock {
    fn epoch_secs(&self) -> Option<i64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() as i64)
    }
}
