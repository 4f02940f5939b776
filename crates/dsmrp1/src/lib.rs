//! Read and decode DSMR P1 smart meter telegrams.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte sources (serial port, capture file, stdin) and replay pacing
//! - [`telegram`]: framing, CRC16 validation, body parsing and value decoding
//!
//! ```no_run
//! use dsmrp1::telegram::{poll, Reading, TimezonePolicy};
//! use dsmrp1::transport::Source;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Source::open_file("capture.txt")?;
//! for telegram in poll(source)? {
//!     let records = telegram.parse()?;
//!     let reading = Reading::from_records(&records, &TimezonePolicy::default())?;
//!     println!("{:?}", reading.power_delivered);
//! }
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use dsmrp1_transport::*;
}

/// Re-export telegram types.
pub mod telegram {
    pub use dsmrp1_telegram::*;
}
