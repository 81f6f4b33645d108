//! Where readings come from.
//!
//! - `random`: bounded uniform CO2 levels for running without a network
//! - `json`: pull one numeric field out of an API response
//! - `serial`: the `CO2 concentration: ...` text line sent over UART
//! - `tracker`: current/previous reading and the delta between them

pub mod json;
pub mod random;
pub mod serial;
pub mod tracker;

use crate::utils::connection::http::TransportError;

pub use random::RandomLevels;
pub use tracker::ReadingTracker;

/// Reasons a sample could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
    /// Body is not valid JSON.
    InvalidJson,
    /// The JSON pointer does not resolve.
    MissingField,
    /// The field is neither a finite number nor a numeric string.
    NotNumeric,
    /// A serial line without the `CO2 concentration: ` marker.
    MarkerNotFound,
    /// Network is down, the cycle is skipped.
    NotConnected,
    /// No access token, login has not succeeded.
    NotAuthenticated,
    /// Login answered without a token.
    MissingToken,
    /// Wall clock has no time yet.
    ClockNotSet,
    /// Server answered with a non-2xx status.
    Http(u16),
    Transport(TransportError),
}

impl core::fmt::Display for SourceError {
    fn fmt(
        &self,
        f: &mut core::fmt::Formatter<'_>,
    ) -> core::fmt::Result {
        match self {
            SourceError::InvalidJson => write!(f, "response is not valid JSON"),
            SourceError::MissingField => write!(f, "reading field not found"),
            SourceError::NotNumeric => write!(f, "reading field is not a number"),
            SourceError::MarkerNotFound => {
                write!(f, "CO2 concentration not found in the received data")
            }
            SourceError::NotConnected => write!(f, "network not connected"),
            SourceError::NotAuthenticated => write!(f, "no access token"),
            SourceError::MissingToken => write!(f, "login response carries no token"),
            SourceError::ClockNotSet => write!(f, "current time unknown"),
            SourceError::Http(code) => write!(f, "HTTP response code: {}", code),
            SourceError::Transport(e) => write!(f, "transport: {}", e),
        }
    }
}

impl From<TransportError> for SourceError {
    fn from(e: TransportError) -> Self {
        SourceError::Transport(e)
    }
}

/// Anything that produces one reading per poll.
#[allow(async_fn_in_trait)]
pub trait ValueSource {
    async fn sample(&mut self) -> Result<f32, SourceError>;
}
