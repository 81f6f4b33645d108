//! Simulated CO2 levels.

use rand_core::RngCore;

use super::{SourceError, ValueSource};

/// Lowest simulated level (ppm).
pub const LEVEL_MIN: u32 = 500;
/// Highest simulated level (ppm), inclusive.
pub const LEVEL_MAX: u32 = 900;

/// Uniform integer levels in `[min, max]`.
pub struct RandomLevels<R> {
    rng: R,
    min: u32,
    max: u32,
}

impl<R: RngCore> RandomLevels<R> {
    pub fn new(rng: R) -> Self {
        Self::with_bounds(rng, LEVEL_MIN, LEVEL_MAX)
    }

    /// Bounds are swapped if given in the wrong order.
    pub fn with_bounds(
        rng: R,
        min: u32,
        max: u32,
    ) -> Self {
        Self {
            rng,
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn next_level(&mut self) -> u32 {
        let span = (self.max - self.min) as u64 + 1;
        // Reject the tail of the u32 range so every level is equally likely.
        let zone = (1u64 << 32) - ((1u64 << 32) % span);
        loop {
            let v = self.rng.next_u32() as u64;
            if v < zone {
                return self.min + (v % span) as u32;
            }
        }
    }
}

impl<R: RngCore> ValueSource for RandomLevels<R> {
    async fn sample(&mut self) -> Result<f32, SourceError> {
        Ok(self.next_level() as f32)
    }
}
