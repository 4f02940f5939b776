use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

use crate::checksum::{checksum, format_checksum};
use crate::error::{FrameError, Result};
use crate::telegram::Telegram;

/// Start-of-telegram delimiter.
pub const START: u8 = b'/';

/// End-of-body delimiter; the checksum line follows it.
pub const END: u8 = b'!';

/// Checksum trailer: 4 hex digits + CR LF.
pub const TRAILER_LEN: usize = 6;

/// Default upper bound on a buffered telegram candidate: 16 KiB.
///
/// Real telegrams are a few hundred bytes to about 2 KiB.
pub const DEFAULT_MAX_TELEGRAM_SIZE: usize = 16 * 1024;

/// Default number of consecutive read failures before a reader gives up.
pub const DEFAULT_MAX_CONSECUTIVE_READ_ERRORS: u32 = 16;

/// Decode one telegram from the front of a buffer.
///
/// Wire format:
/// ```text
/// /<header>\r\n
/// \r\n
/// <code>(<value>)(<value>)...\r\n
/// ...
/// !<CRC16 as 4 uppercase hex digits>\r\n
/// ```
///
/// Bytes before the first `/` are noise and are discarded. Returns `Ok(None)`
/// if the buffer doesn't contain a complete frame yet. A complete frame is
/// always consumed from the buffer; if its trailer is malformed or its checksum
/// does not match, the error is returned and the caller may simply call again.
pub fn decode_frame(src: &mut BytesMut, max_size: usize) -> Result<Option<Telegram>> {
    let Some(start) = src.iter().position(|&b| b == START) else {
        if !src.is_empty() {
            trace!(discarded = src.len(), "skipping noise");
            src.clear();
        }
        return Ok(None);
    };
    if start > 0 {
        trace!(discarded = start, "skipping noise");
        src.advance(start);
    }

    let Some(end) = src.iter().position(|&b| b == END) else {
        return incomplete(src, max_size);
    };
    let body_len = end + 1;

    let Some(newline) = src[body_len..].iter().position(|&b| b == b'\n') else {
        return incomplete(src, max_size);
    };
    let frame_len = body_len + newline + 1;

    let frame = src.split_to(frame_len).freeze();
    let trailer = &frame[body_len..];
    if trailer.len() != TRAILER_LEN {
        return Err(FrameError::TrailerLength { len: trailer.len() });
    }

    let body = frame.slice(..body_len);
    let computed = format_checksum(checksum(&body));
    let wire = &trailer[..4];
    if wire != computed.as_bytes() {
        return Err(FrameError::ChecksumMismatch {
            wire: String::from_utf8_lossy(wire).into_owned(),
            computed,
        });
    }

    Ok(Some(Telegram::from_validated(body)))
}

/// The buffer starts with `/` but the frame is not complete yet.
fn incomplete(src: &mut BytesMut, max_size: usize) -> Result<Option<Telegram>> {
    if src.len() <= max_size {
        return Ok(None); // Need more data
    }
    let size = src.len();
    // Drop the start delimiter so the next scan resumes at the following `/`.
    src.advance(1);
    Err(FrameError::TooLarge {
        size,
        max: max_size,
    })
}

/// Append `body` followed by its checksum trailer.
///
/// `body` should run from `/` through `!` inclusive.
pub fn encode_frame(body: &[u8], dst: &mut BytesMut) {
    dst.reserve(body.len() + TRAILER_LEN);
    dst.put_slice(body);
    dst.put_slice(format_checksum(checksum(body)).as_bytes());
    dst.put_slice(b"\r\n");
}

/// Configuration for telegram readers.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum size of a telegram candidate in bytes. Default: 16 KiB.
    pub max_telegram_size: usize,
    /// Consecutive read failures tolerated before the reader stops. Default: 16.
    pub max_consecutive_read_errors: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_telegram_size: DEFAULT_MAX_TELEGRAM_SIZE,
            max_consecutive_read_errors: DEFAULT_MAX_CONSECUTIVE_READ_ERRORS,
        }
    }
}
