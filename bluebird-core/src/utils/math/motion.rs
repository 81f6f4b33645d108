//! Motion planning for continuous-rotation servos.
//!
//! A 360° servo has no position feedback, so "how far" is expressed as "how
//! long". A reading delta picks the direction from its sign and, in the scaled
//! profile, the rotation time from its magnitude.
//!
//! # Example
//! ```rust
//! use bluebird_core::utils::math::motion::{Direction, DurationProfile, MotionPlan};
//! let profile = DurationProfile::Scaled { ms_per_unit: 15, max_ms: 6000 };
//! let plan = MotionPlan::from_delta(-40.0, &profile);
//! assert_eq!(plan.direction, Direction::CounterClockwise);
//! assert_eq!(plan.duration.as_millis(), 600);
//! ```

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Rotation direction of a continuous servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Winds the string up.
    Clockwise,
    /// Lets the string out.
    CounterClockwise,
}

impl Direction {
    /// Strictly positive deltas turn clockwise; zero and negative turn the other way.
    pub fn from_delta(delta: f32) -> Self {
        if delta > 0.0 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }
}

/// How long a single rotation lasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DurationProfile {
    /// Every rotation lasts `ms` milliseconds regardless of the delta.
    Fixed { ms: u64 },
    /// `|delta| * ms_per_unit` milliseconds, capped at `max_ms`.
    Scaled { ms_per_unit: u64, max_ms: u64 },
}

impl Default for DurationProfile {
    fn default() -> Self {
        DurationProfile::Scaled {
            ms_per_unit: 15,
            max_ms: 6_000,
        }
    }
}

impl DurationProfile {
    /// Rotation time for the given delta.
    pub fn duration_for(
        &self,
        delta: f32,
    ) -> Duration {
        match *self {
            DurationProfile::Fixed { ms } => Duration::from_millis(ms),
            DurationProfile::Scaled { ms_per_unit, max_ms } => {
                // NaN deltas fall through to zero.
                let scaled = libm::roundf(libm::fabsf(delta) * ms_per_unit as f32);
                let ms = if scaled.is_nan() {
                    0
                } else {
                    // float to int casts saturate
                    scaled as u64
                };
                let ms = ms.min(max_ms);
                Duration::from_millis(ms)
            }
        }
    }
}

/// Direction and duration chosen for one actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionPlan {
    pub direction: Direction,
    pub duration: Duration,
}

impl MotionPlan {
    pub fn from_delta(
        delta: f32,
        profile: &DurationProfile,
    ) -> Self {
        MotionPlan {
            direction: Direction::from_delta(delta),
            duration: profile.duration_for(delta),
        }
    }
}
