//! Firmware logic for the Bluebird data physicalization on no-std embedded platforms.
//!
//! For a runnable host build of every sketch, see `bluebird-app/mock-mcu`.
#![no_std]

pub mod utils;
