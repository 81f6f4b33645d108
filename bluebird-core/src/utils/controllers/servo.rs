//! Servo bank on a PCA9685 PWM driver.
//!
//! Continuous-rotation servos hang off the PCA9685 outputs and share one I2C
//! bus. A rotation writes the direction pulse, waits, and writes the neutral
//! pulse. The blocking form waits through `DelayNs`; the `begin`/`poll` pair
//! holds the deadline instead so the caller keeps control.

use core::cell::RefCell;

use embassy_time::{Duration, Instant};
use embedded_hal::{delay::DelayNs, i2c::I2c};
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use crate::utils::{
    config::ServoConfig,
    math::motion::{Direction, MotionPlan},
};

const CHANNELS: [Channel; 16] = [
    Channel::C0,
    Channel::C1,
    Channel::C2,
    Channel::C3,
    Channel::C4,
    Channel::C5,
    Channel::C6,
    Channel::C7,
    Channel::C8,
    Channel::C9,
    Channel::C10,
    Channel::C11,
    Channel::C12,
    Channel::C13,
    Channel::C14,
    Channel::C15,
];

/// Map an output index to the driver's channel.
pub fn channel(index: u8) -> Option<Channel> {
    CHANNELS.get(index as usize).copied()
}

/// Errors that can occur when driving the servo bank.
#[derive(Debug)]
pub enum DeviceError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
    PwmNotInitialized,
    InvalidChannel(u8),
}

impl<E: core::fmt::Debug> core::fmt::Display for DeviceError<E> {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        match self {
            DeviceError::PwmError(e) => write!(f, "PCA9685 error: {:?}", e),
            DeviceError::PwmNotInitialized => write!(f, "PWM driver not initialized"),
            DeviceError::InvalidChannel(c) => write!(f, "no PWM output {}", c),
        }
    }
}

/// Rotation state of the whole bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    /// Every channel sits at the neutral pulse.
    Idle,
    /// Every channel turns in `direction` until `deadline`.
    Rotating {
        direction: Direction,
        deadline: Instant,
    },
}

/// Driver for a bank of continuous servos behind one PCA9685.
pub struct ServoBank<'a, I2C: 'static> {
    i2c: &'a RefCell<I2C>,
    pub pwm: Option<Pca9685<RefCellDevice<'a, I2C>>>,
    config: ServoConfig,
    state: ActuatorState,
}

impl<'a, I2C, E> ServoBank<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        config: ServoConfig,
    ) -> Self {
        ServoBank {
            i2c: i2c_bus,
            pwm: None,
            config,
            state: ActuatorState::Idle,
        }
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Create the PCA9685 driver at the configured address.
    pub fn init_devices(&mut self) -> Result<(), DeviceError<E>> {
        let pwm = Pca9685::new(
            RefCellDevice::new(self.i2c),
            PwmAddress::from(self.config.address),
        )
        .map_err(DeviceError::PwmError)?;

        self.pwm = Some(pwm);
        Ok(())
    }

    /// Scan the I2C bus for devices and log any found addresses.
    pub fn scan_bus(&self) {
        let mut bus = self.i2c.borrow_mut();
        for addr in 0x03..0x78 {
            if bus.write(addr, &[]).is_ok() {
                tracing::warn!("I2C device found at 0x{:02X}", addr);
            }
        }
    }

    /// Wake the PCA9685 and set the servo frame rate.
    pub fn configure_pwm(&mut self) -> Result<(), DeviceError<E>> {
        let prescale = self.config.prescale;
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.enable().map_err(DeviceError::PwmError)?;
        tracing::info!("PWM enabled");
        pca.set_prescale(prescale).map_err(DeviceError::PwmError)?;
        tracing::info!(prescale, "PWM prescale set");
        Ok(())
    }

    /// Write `off_ticks` to one output, with the pulse starting at tick 0.
    pub fn set_pulse(
        &mut self,
        index: u8,
        off_ticks: u16,
    ) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        write_pulse(pca, index, off_ticks)
    }

    /// Put one servo back to rest.
    pub fn stop(
        &mut self,
        index: u8,
    ) -> Result<(), DeviceError<E>> {
        self.set_pulse(index, self.config.pulses.neutral)
    }

    /// Put every configured servo back to rest.
    ///
    /// Every channel is tried even when an earlier one fails; the first error
    /// is returned.
    pub fn stop_all(&mut self) -> Result<(), DeviceError<E>> {
        self.state = ActuatorState::Idle;
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        park_all(pca, &self.config.channels, self.config.pulses.neutral)
    }

    /// Turn one servo for `duration`, blocking, then stop it.
    ///
    /// On failure the servo is parked before the error is returned.
    pub fn rotate<D: DelayNs>(
        &mut self,
        index: u8,
        direction: Direction,
        duration: Duration,
        delay: &mut D,
    ) -> Result<(), DeviceError<E>> {
        let pulses = self.config.pulses;
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        rotate_each(
            pca,
            &[index],
            pulses.for_direction(direction),
            pulses.neutral,
            duration,
            delay,
        )
        .inspect_err(|_| {
            let _ = park_all(pca, &[index], pulses.neutral);
        })
    }

    /// Plan a rotation for `delta` and run it on every channel in turn.
    ///
    /// If any write fails, every channel is parked before the error is
    /// returned.
    pub fn actuate<D: DelayNs>(
        &mut self,
        delta: f32,
        delay: &mut D,
    ) -> Result<MotionPlan, DeviceError<E>> {
        let plan = MotionPlan::from_delta(delta, &self.config.profile);
        tracing::info!(
            delta,
            direction = ?plan.direction,
            ms = plan.duration.as_millis(),
            "actuating"
        );
        let pulses = self.config.pulses;
        let channels = &self.config.channels;
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        rotate_each(
            pca,
            channels,
            pulses.for_direction(plan.direction),
            pulses.neutral,
            plan.duration,
            delay,
        )
        .inspect_err(|_| {
            let _ = park_all(pca, channels, pulses.neutral);
        })?;
        Ok(plan)
    }

    /// Start turning every channel at once and return immediately.
    ///
    /// A rotation still in progress is stopped first. If a channel cannot be
    /// started, the whole bank is parked and stays `Idle`.
    pub fn begin(
        &mut self,
        delta: f32,
        now: Instant,
    ) -> Result<MotionPlan, DeviceError<E>> {
        if matches!(self.state, ActuatorState::Rotating { .. }) {
            self.stop_all()?;
        }
        let plan = MotionPlan::from_delta(delta, &self.config.profile);
        let pulses = self.config.pulses;
        let channels = &self.config.channels;
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        let pulse = pulses.for_direction(plan.direction);
        let started = channels
            .iter()
            .try_for_each(|&index| write_pulse(pca, index, pulse));
        if let Err(e) = started {
            let _ = park_all(pca, channels, pulses.neutral);
            self.state = ActuatorState::Idle;
            return Err(e);
        }
        self.state = ActuatorState::Rotating {
            direction: plan.direction,
            deadline: now + plan.duration,
        };
        Ok(plan)
    }

    /// Stop the bank once the deadline has passed. Returns the state after the check.
    pub fn poll(
        &mut self,
        now: Instant,
    ) -> Result<ActuatorState, DeviceError<E>> {
        if let ActuatorState::Rotating { deadline, .. } = self.state {
            if now >= deadline {
                self.stop_all()?;
            }
        }
        Ok(self.state)
    }
}

fn write_pulse<I2C, E>(
    pca: &mut Pca9685<I2C>,
    index: u8,
    off_ticks: u16,
) -> Result<(), DeviceError<E>>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    let ch = channel(index).ok_or(DeviceError::InvalidChannel(index))?;
    pca.set_channel_on_off(ch, 0, off_ticks)
        .map_err(DeviceError::PwmError)
}

/// Drive each channel at `pulse` for `duration`, one after another.
fn rotate_each<I2C, E, D>(
    pca: &mut Pca9685<I2C>,
    channels: &[u8],
    pulse: u16,
    neutral: u16,
    duration: Duration,
    delay: &mut D,
) -> Result<(), DeviceError<E>>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
    D: DelayNs,
{
    let ms = duration.as_millis().min(u32::MAX as u64) as u32;
    for &index in channels {
        write_pulse(pca, index, pulse)?;
        delay.delay_ms(ms);
        write_pulse(pca, index, neutral)?;
    }
    Ok(())
}

/// Write `neutral` to every channel, continuing past failures.
fn park_all<I2C, E>(
    pca: &mut Pca9685<I2C>,
    channels: &[u8],
    neutral: u16,
) -> Result<(), DeviceError<E>>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    let mut first = None;
    for &index in channels {
        if let Err(e) = write_pulse(pca, index, neutral) {
            tracing::error!(index, "could not park servo: {}", e);
            first.get_or_insert(e);
        }
    }
    first.map_or(Ok(()), Err)
}
