use std::io::{BufRead, BufReader, Read};
use std::time::{Duration, Instant};

use tracing::trace;

/// A real meter emits one telegram every 10 seconds.
pub const DEFAULT_TELEGRAM_INTERVAL: Duration = Duration::from_secs(10);

const TELEGRAM_START: u8 = b'/';

/// Replays a captured byte stream at the cadence of a real meter.
///
/// Whenever the next byte to hand out is a telegram start (`/`), the read
/// blocks until `interval` has passed since the previous telegram was released.
/// A single read never returns bytes past the following `/`, so each telegram
/// is released on its own. The first telegram also waits one interval. Bytes
/// are passed through unchanged.
///
/// Intended for simulation and testing only.
pub struct RateLimited<R> {
    inner: BufReader<R>,
    interval: Duration,
    next_release: Instant,
}

impl<R: Read> RateLimited<R> {
    /// Wrap `inner`, releasing one telegram per `interval`.
    pub fn new(inner: R, interval: Duration) -> Self {
        Self {
            inner: BufReader::new(inner),
            interval,
            next_release: Instant::now() + interval,
        }
    }

    /// The configured release interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Consume the wrapper and return the inner reader.
    ///
    /// Bytes already buffered but not yet returned are lost.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    fn wait_for_slot(&mut self) {
        if let Some(remaining) = self.next_release.checked_duration_since(Instant::now()) {
            trace!(?remaining, "holding back telegram");
            std::thread::sleep(remaining);
        }
        self.next_release = Instant::now() + self.interval;
    }
}

impl<R: Read> Read for RateLimited<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let (limit, starts_telegram) = {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                return Ok(0);
            }
            let window = &available[..available.len().min(buf.len())];
            match window.iter().position(|&b| b == TELEGRAM_START) {
                None => (window.len(), false),
                // Not at a telegram start yet: hand out everything before it.
                Some(i) if i > 0 => (i, false),
                Some(_) => {
                    let next = window[1..]
                        .iter()
                        .position(|&b| b == TELEGRAM_START)
                        .map_or(window.len(), |i| i + 1);
                    (next, true)
                }
            }
        };

        if starts_telegram {
            self.wait_for_slot();
        }

        let available = self.inner.fill_buf()?;
        buf[..limit].copy_from_slice(&available[..limit]);
        self.inner.consume(limit);
        Ok(limit)
    }
}

impl<R> std::fmt::Debug for RateLimited<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimited")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
