use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::{debug, error, warn};

use crate::codec::{decode_frame, ReaderConfig};
use crate::error::{FrameError, Result};
use crate::telegram::Telegram;

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 1024;

/// Counters describing what a reader has seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Telegrams with a valid checksum.
    pub telegrams: u64,
    /// Frames dropped because the checksum did not match.
    pub checksum_mismatches: u64,
    /// Frames dropped because of a malformed trailer or excessive size.
    pub framing_errors: u64,
    /// Failed reads on the underlying source.
    pub read_errors: u64,
}

impl ReaderStats {
    /// Log and count a frame that was dropped.
    pub(crate) fn record_discard(&mut self, err: &FrameError) {
        match err {
            FrameError::ChecksumMismatch { wire, computed } => {
                self.checksum_mismatches += 1;
                warn!(%wire, %computed, "CRC values do not match, dropping telegram");
            }
            other => {
                self.framing_errors += 1;
                warn!(error = %other, "malformed telegram, dropping");
            }
        }
    }
}

/// Reads checksum-validated telegrams from any `Read` stream.
///
/// Noise between telegrams, frames with a malformed trailer and frames with a
/// checksum mismatch are logged and skipped; callers only ever see valid
/// telegrams.
pub struct TelegramReader<T> {
    inner: T,
    buf: BytesMut,
    config: ReaderConfig,
    stats: ReaderStats,
    consecutive_read_errors: u32,
    eof: bool,
}

impl<T: Read> TelegramReader<T> {
    /// Create a new telegram reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a new telegram reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            stats: ReaderStats::default(),
            consecutive_read_errors: 0,
            eof: false,
        }
    }

    /// Read the next valid telegram (blocking).
    ///
    /// Returns `Ok(None)` at end of stream; an incomplete trailing frame is
    /// dropped. Returns an error only once the configured number of
    /// consecutive read failures is reached.
    pub fn read_telegram(&mut self) -> Result<Option<Telegram>> {
        loop {
            match decode_frame(&mut self.buf, self.config.max_telegram_size) {
                Ok(Some(telegram)) => {
                    self.stats.telegrams += 1;
                    return Ok(Some(telegram));
                }
                Ok(None) => {}
                Err(err) => {
                    self.stats.record_discard(&err);
                    continue;
                }
            }

            if self.eof {
                if !self.buf.is_empty() {
                    debug!(
                        bytes = self.buf.len(),
                        "stream ended inside a telegram, dropping partial frame"
                    );
                    self.buf.clear();
                }
                return Ok(None);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
                    ) =>
                {
                    continue
                }
                Err(err) => {
                    self.record_read_error(err)?;
                    continue;
                }
            };

            self.consecutive_read_errors = 0;
            if read == 0 {
                self.eof = true;
                continue;
            }
            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// A failed read loses whatever partial frame was buffered; scanning
    /// restarts at the next `/`.
    fn record_read_error(&mut self, err: std::io::Error) -> Result<()> {
        self.stats.read_errors += 1;
        self.consecutive_read_errors += 1;

        if self.consecutive_read_errors >= self.config.max_consecutive_read_errors {
            error!(
                error = %err,
                attempts = self.consecutive_read_errors,
                "giving up after repeated read failures"
            );
            return Err(FrameError::Io(err));
        }

        warn!(
            error = %err,
            discarded = self.buf.len(),
            "read failed, restarting telegram search"
        );
        self.buf.clear();
        Ok(())
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

/// Yields telegrams until end of stream or a fatal read error.
impl<T: Read> Iterator for TelegramReader<T> {
    type Item = Telegram;

    fn next(&mut self) -> Option<Telegram> {
        match self.read_telegram() {
            Ok(telegram) => telegram,
            Err(_) => None,
        }
    }
}
