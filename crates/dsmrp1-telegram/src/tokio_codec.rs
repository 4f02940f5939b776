use bytes::BytesMut;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::debug;

use crate::codec::{decode_frame, ReaderConfig};
use crate::error::{FrameError, Result};
use crate::reader::ReaderStats;
use crate::telegram::Telegram;

/// `tokio_util` decoder yielding checksum-validated telegrams.
///
/// Recoverable framing errors are logged and counted the same way
/// [`TelegramReader`](crate::TelegramReader) does; the stream only ends with
/// an error when the underlying source fails.
#[derive(Debug, Default)]
pub struct TelegramCodec {
    config: ReaderConfig,
    stats: ReaderStats,
}

impl TelegramCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReaderConfig) -> Self {
        Self {
            config,
            stats: ReaderStats::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }
}

impl Decoder for TelegramCodec {
    type Item = Telegram;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Telegram>> {
        loop {
            match decode_frame(src, self.config.max_telegram_size) {
                Ok(Some(telegram)) => {
                    self.stats.telegrams += 1;
                    return Ok(Some(telegram));
                }
                Ok(None) => return Ok(None),
                Err(err) => self.stats.record_discard(&err),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Telegram>> {
        if let Some(telegram) = self.decode(src)? {
            return Ok(Some(telegram));
        }
        if !src.is_empty() {
            debug!(
                bytes = src.len(),
                "stream ended inside a telegram, dropping partial frame"
            );
            src.clear();
        }
        Ok(None)
    }
}

/// Wrap an async byte source as a stream of telegrams.
pub fn telegram_stream<R: AsyncRead>(input: R) -> FramedRead<R, TelegramCodec> {
    FramedRead::new(input, TelegramCodec::new())
}
