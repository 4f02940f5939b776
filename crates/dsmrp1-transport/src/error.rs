use std::path::PathBuf;

/// Errors that can occur while opening a byte source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open a capture file.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open or configure a serial device.
    #[cfg(feature = "serial")]
    #[error("failed to open serial device {device}: {source}")]
    Serial {
        device: String,
        source: serialport::Error,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;
