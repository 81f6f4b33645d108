//! Module Exports
//!
//! Network side of the gateway sketch.
//!
//! # Modules
//! - `http`: HTTP/1.0 client over `embassy-net`, behind the `HttpTransport` trait.
//! - `gateway`: building API login and room data polling, weather polling.

pub mod gateway;
pub mod http;
