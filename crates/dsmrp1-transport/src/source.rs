use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A sequential byte source carrying P1 telegrams.
///
/// End-of-stream is reported the usual way (a read returning `0`), read
/// failures surface as `std::io::Error`.
pub struct Source {
    inner: SourceInner,
}

enum SourceInner {
    File(File),
    Stdin(std::io::Stdin),
    #[cfg(feature = "serial")]
    Serial(Box<dyn serialport::SerialPort>),
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            SourceInner::File(file) => file.read(buf),
            SourceInner::Stdin(stdin) => stdin.read(buf),
            #[cfg(feature = "serial")]
            SourceInner::Serial(port) => port.read(buf),
        }
    }
}

impl Source {
    /// Open a captured byte stream stored in a file.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "opened capture file");
        Ok(Self {
            inner: SourceInner::File(file),
        })
    }

    /// Read telegrams from standard input.
    pub fn stdin() -> Self {
        Self {
            inner: SourceInner::Stdin(std::io::stdin()),
        }
    }

    /// Open a serial device with the given line settings.
    #[cfg(feature = "serial")]
    pub fn open_serial(config: &crate::serial::SerialConfig) -> Result<Self> {
        let port = crate::serial::open(config)?;
        Ok(Self {
            inner: SourceInner::Serial(port),
        })
    }

    /// Short description of the source kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            SourceInner::File(_) => "file",
            SourceInner::Stdin(_) => "stdin",
            #[cfg(feature = "serial")]
            SourceInner::Serial(_) => "serial",
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source").field("type", &self.kind()).finish()
    }
}
