//! Utility re-exports and helper macros for the Bluebird installation.
//!
//! - `config`: calibration constants and API settings
//! - `connection`: HTTP transport and the gateway clients
//! - `controllers`: servo bank, heartbeat LED, reading-to-motion controller
//! - `math`: delta to rotation planning
//! - `schedule`: poll intervals and wall-clock access
//! - `sources`: random, JSON and serial readings plus the reading tracker
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod config;
pub mod connection;
pub mod controllers;
pub mod math;
pub mod schedule;
pub mod sources;

pub use connection::gateway::{Gateway, WeatherClient};
pub use controllers::BluebirdController;
pub use embassy_time::*;
pub use math::motion::{Direction, DurationProfile, MotionPlan};

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
