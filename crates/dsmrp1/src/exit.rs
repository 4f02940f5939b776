use std::fmt;
use std::io;

use dsmrp1_telegram::{FrameError, ReadingError, StructureError};
use dsmrp1_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. } => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

/// Only I/O failures reach the CLI; framing errors are skipped by the reader.
pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => CliError::new(TRANSPORT_ERROR, format!("{context}: {source}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn structure_error(context: &str, err: StructureError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn reading_error(context: &str, err: ReadingError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_transport_error() {
        let err = TransportError::Open {
            path: "/nonexistent".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(transport_error("open", err).code, TRANSPORT_ERROR);
    }

    #[test]
    fn persistent_read_failure_maps_to_transport_error() {
        let err = FrameError::Io(io::Error::other("unplugged"));
        let cli = frame_error("read", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("read: "));
    }

    #[test]
    fn malformed_body_maps_to_data_invalid() {
        assert_eq!(
            structure_error("parse", StructureError::NoRecords).code,
            DATA_INVALID
        );
    }
}
