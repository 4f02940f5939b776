//! Byte sources for DSMR P1 telegram streams.
//!
//! The telegram decoder only needs something that implements [`std::io::Read`].
//! This crate provides the sources a P1 reader is typically fed from:
//! - A physical serial port (behind the `serial` feature)
//! - A captured byte stream in a file
//! - Standard input
//!
//! [`RateLimited`] replays a capture at the cadence of a real meter, which is
//! handy for exercising consumers without the hardware.

pub mod error;
pub mod pacing;
#[cfg(feature = "serial")]
pub mod serial;
pub mod source;

pub use error::{Result, TransportError};
pub use pacing::{RateLimited, DEFAULT_TELEGRAM_INTERVAL};
#[cfg(feature = "serial")]
pub use serial::{
    DataBits, Parity, SerialConfig, StopBits, DEFAULT_BAUD_RATE, DEFAULT_DEVICE, DEFAULT_TIMEOUT,
};
pub use source::Source;
