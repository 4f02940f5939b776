//! Serial line settings for the P1 port.
//!
//! DSMR 4+ meters talk 115200 baud, 8 data bits, no parity, one stop bit.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::{Result, TransportError};

/// Default device path on Linux with a USB-to-serial P1 cable.
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Default P1 baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default read timeout; a meter emits a telegram roughly every 10 seconds,
/// timeouts in between are reported as `TimedOut` and retried by the reader.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Parity setting for the serial line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Number of data bits per character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    #[default]
    Eight,
}

/// Number of stop bits per character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl FromStr for Parity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            other => Err(format!("unknown parity: {other}")),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Parity::None => "none",
            Parity::Odd => "odd",
            Parity::Even => "even",
        })
    }
}

impl DataBits {
    pub fn count(self) -> u8 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl StopBits {
    pub fn count(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// Serial port configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub device: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Read timeout applied to the port.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SerialConfig {
    /// Default line settings for the given device.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }
}

fn to_serialport_parity(p: Parity) -> serialport::Parity {
    match p {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn to_serialport_data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn to_serialport_stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

pub(crate) fn open(config: &SerialConfig) -> Result<Box<dyn serialport::SerialPort>> {
    let port = serialport::new(&config.device, config.baud_rate)
        .data_bits(to_serialport_data_bits(config.data_bits))
        .parity(to_serialport_parity(config.parity))
        .stop_bits(to_serialport_stop_bits(config.stop_bits))
        .timeout(config.timeout)
        .open()
        .map_err(|source| TransportError::Serial {
            device: config.device.clone(),
            source,
        })?;

    info!(
        device = %config.device,
        baud = config.baud_rate,
        "opened serial port"
    );
    Ok(port)
}
