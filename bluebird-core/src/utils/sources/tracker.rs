//! Current and previous reading.

use super::SourceError;

/// Holds the live reading and the one before it.
///
/// The first reading only sets the baseline; deltas start with the second.
/// Firmware that seeded the previous reading with 0 moved on the first sample
/// instead.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadingTracker {
    current: Option<f32>,
    previous: Option<f32>,
}

impl ReadingTracker {
    pub const fn new() -> Self {
        Self {
            current: None,
            previous: None,
        }
    }

    /// Store a new reading and return `current - previous`.
    pub fn record(
        &mut self,
        reading: f32,
    ) -> Option<f32> {
        self.previous = self.current;
        self.current = Some(reading);
        let delta = self.delta();
        tracing::info!(
            previous = ?self.previous,
            current = reading,
            delta = ?delta,
            "reading recorded"
        );
        delta
    }

    /// Record a successful sample; on failure log it and leave the state untouched.
    pub fn apply(
        &mut self,
        sample: Result<f32, SourceError>,
    ) -> Option<f32> {
        match sample {
            Ok(reading) => self.record(reading),
            Err(error) => {
                tracing::error!(%error, current = ?self.current, "sample failed, reading unchanged");
                None
            }
        }
    }

    pub fn current(&self) -> Option<f32> {
        self.current
    }

    pub fn previous(&self) -> Option<f32> {
        self.previous
    }

    pub fn delta(&self) -> Option<f32> {
        Some(self.current? - self.previous?)
    }
}
