//! Math utilities for the Bluebird installation.
//!
//! This module turns reading deltas into servo rotation plans.

pub mod motion;
