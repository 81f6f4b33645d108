//! Heartbeat LED.
//!
//! The simplest sketch of the installation: toggle one pin with a fixed on and
//! off time and print a greeting every cycle.

use embedded_hal::{delay::DelayNs, digital::OutputPin};

/// Blinks a single LED pin.
pub struct Blinker<P> {
    pin: P,
    on_ms: u32,
    off_ms: u32,
    cycles: u32,
}

impl<P: OutputPin> Blinker<P> {
    /// One second on, one second off.
    pub fn new(pin: P) -> Self {
        Self::with_timing(pin, 1_000, 1_000)
    }

    pub fn with_timing(
        pin: P,
        on_ms: u32,
        off_ms: u32,
    ) -> Self {
        Self {
            pin,
            on_ms,
            off_ms,
            cycles: 0,
        }
    }

    /// Run one high/low cycle, blocking for its full length.
    pub fn cycle<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<(), P::Error> {
        self.pin.set_high()?;
        delay.delay_ms(self.on_ms);
        self.pin.set_low()?;
        delay.delay_ms(self.off_ms);

        self.cycles = self.cycles.wrapping_add(1);
        tracing::info!(cycle = self.cycles, "Hello World");
        Ok(())
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }
}
