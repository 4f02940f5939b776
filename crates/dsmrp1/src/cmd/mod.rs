use clap::{Args, Subcommand};
use std::path::PathBuf;

use dsmrp1_telegram::DEFAULT_MAX_TELEGRAM_SIZE;
use dsmrp1_transport::{Parity, SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_DEVICE};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod envinfo;
pub mod read;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read telegrams from a meter or a capture and print them.
    Read(ReadArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

/// Line settings for the P1 serial port.
#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial device connected to the P1 port.
    #[arg(long, env = "DSMRP1_DEVICE", default_value = DEFAULT_DEVICE)]
    pub device: String,
    /// Serial baud rate.
    #[arg(long, env = "DSMRP1_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Serial parity (none, odd, even). DSMR 2.2 meters use even.
    #[arg(long, default_value = "none")]
    pub parity: Parity,
}

impl SerialArgs {
    pub fn to_config(&self) -> SerialConfig {
        SerialConfig {
            baud_rate: self.baud,
            parity: self.parity,
            ..SerialConfig::new(self.device.clone())
        }
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Read a captured byte stream from a file instead of the device.
    #[arg(long, value_name = "PATH", conflicts_with = "stdin")]
    pub testfile: Option<PathBuf>,
    /// Read the byte stream from standard input instead of the device.
    #[arg(long, conflicts_with = "testfile")]
    pub stdin: bool,
    /// Release one telegram per interval (e.g. 10s, 500ms), like a real meter.
    #[arg(long, value_name = "DURATION")]
    pub ratelimit: Option<String>,
    /// Exit after printing N telegrams.
    #[arg(long)]
    pub count: Option<usize>,
    /// Include every record of the telegram in the output.
    #[arg(long)]
    pub records: bool,
    /// Drop telegram candidates larger than this many bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_TELEGRAM_SIZE)]
    pub max_telegram_size: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug)]
pub struct EnvinfoArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
}
