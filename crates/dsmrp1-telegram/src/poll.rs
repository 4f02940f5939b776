//! Background polling of a telegram source.
//!
//! [`poll`] moves a [`TelegramReader`] onto its own thread and hands each
//! validated telegram to the consumer through a bounded channel. With the
//! default capacity of zero every hand-off is a rendezvous: the reader waits
//! until the consumer has taken the previous telegram before scanning on.

use std::io::Read;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info};

use crate::codec::ReaderConfig;
use crate::error::{FrameError, Result};
use crate::reader::{ReaderStats, TelegramReader};
use crate::telegram::Telegram;

/// Default name of the polling thread.
pub const DEFAULT_THREAD_NAME: &str = "p1-poller";

/// Configuration for [`poll_with_config`].
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Settings for the underlying reader.
    pub reader: ReaderConfig,
    /// Telegrams that may wait in the hand-off queue. Default: 0 (rendezvous).
    pub handoff_capacity: usize,
    /// Name given to the polling thread.
    pub thread_name: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            reader: ReaderConfig::default(),
            handoff_capacity: 0,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

/// Start polling `input` on a background thread with default configuration.
pub fn poll<R>(input: R) -> Result<Poller>
where
    R: Read + Send + 'static,
{
    poll_with_config(input, PollConfig::default())
}

/// Start polling `input` on a background thread.
///
/// Only telegrams with a valid checksum are delivered, in stream order. The
/// returned [`Poller`] ends once the source reaches end of stream.
pub fn poll_with_config<R>(input: R, config: PollConfig) -> Result<Poller>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(config.handoff_capacity);
    let reader = TelegramReader::with_config(input, config.reader);

    let handle = std::thread::Builder::new()
        .name(config.thread_name)
        .spawn(move || run(reader, tx))?;

    Ok(Poller {
        rx,
        handle: Some(handle),
    })
}

fn run<R: Read>(mut reader: TelegramReader<R>, tx: SyncSender<Telegram>) -> Result<ReaderStats> {
    info!("polling started");
    loop {
        match reader.read_telegram()? {
            Some(telegram) => {
                if tx.send(telegram).is_err() {
                    debug!("consumer went away, stopping");
                    break;
                }
            }
            None => break,
        }
    }

    let stats = reader.stats().clone();
    info!(
        telegrams = stats.telegrams,
        checksum_mismatches = stats.checksum_mismatches,
        framing_errors = stats.framing_errors,
        read_errors = stats.read_errors,
        "polling finished"
    );
    Ok(stats)
}

/// Consumer side of a running poll: a single-pass sequence of telegrams.
///
/// Iteration ends when the source is exhausted (or the reader gave up after
/// repeated read failures; [`Poller::finish`] tells the two apart).
pub struct Poller {
    rx: Receiver<Telegram>,
    handle: Option<JoinHandle<Result<ReaderStats>>>,
}

impl Poller {
    /// Block until the next telegram arrives; `None` once polling has ended.
    pub fn recv(&self) -> Option<Telegram> {
        self.rx.recv().ok()
    }

    /// Wait up to `timeout` for the next telegram.
    pub fn recv_timeout(&self, timeout: Duration) -> std::result::Result<Telegram, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Stop consuming, wait for the polling thread and return its counters.
    ///
    /// Telegrams not yet received are dropped. Returns the reader's error if
    /// it stopped because of persistent read failures.
    pub fn finish(self) -> Result<ReaderStats> {
        let Poller { rx, handle } = self;
        // Unblocks a reader waiting on the hand-off.
        drop(rx);

        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| FrameError::Io(std::io::Error::other("polling thread panicked")))?,
            None => Ok(ReaderStats::default()),
        }
    }
}

impl Iterator for Poller {
    type Item = Telegram;

    fn next(&mut self) -> Option<Telegram> {
        self.recv()
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("running", &self.handle.as_ref().is_some_and(|h| !h.is_finished()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;

    fn framed(body: &str) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_frame(body.as_bytes(), &mut wire);
        wire.to_vec()
    }

    fn body(n: usize) -> String {
        format!("/XXXZ{n}\r\n\r\n0-0:96.14.0({n:04})\r\n!")
    }

    #[test]
    fn delivers_valid_telegrams_in_order() {
        let mut wire = b"noise".to_vec();
        wire.extend_from_slice(&framed(&body(1)));
        wire.extend_from_slice(body(2).as_bytes());
        wire.extend_from_slice(b"0000\r\n");
        wire.extend_from_slice(&framed(&body(3)));

        let poller = poll(Cursor::new(wire)).unwrap();
        let ids: Vec<String> = poller
            .map(|t| t.identifier().unwrap().to_string())
            .collect();

        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn finish_reports_stats() {
        let mut wire = framed(&body(1));
        wire.extend_from_slice(body(2).as_bytes());
        wire.extend_from_slice(b"0000\r\n");

        let mut poller = poll(Cursor::new(wire)).unwrap();
        assert!(poller.next().is_some());
        assert!(poller.next().is_none());

        let stats = poller.finish().unwrap();
        assert_eq!(stats.telegrams, 1);
        assert_eq!(stats.checksum_mismatches, 1);
    }

    #[test]
    fn truncated_stream_ends_cleanly() {
        let mut wire = framed(&body(1));
        wire.extend_from_slice(&body(2).as_bytes()[..8]);

        let poller = poll(Cursor::new(wire)).unwrap();
        assert_eq!(poller.count(), 1);
    }

    #[test]
    fn slow_consumer_loses_nothing() {
        let mut wire = Vec::new();
        for n in 0..5 {
            wire.extend_from_slice(&framed(&body(n)));
        }

        let poller = poll(Cursor::new(wire)).unwrap();
        let first = poller.recv().unwrap();
        assert_eq!(first.identifier().unwrap(), "0");

        // The reader is parked on the hand-off of telegram 1; nothing is lost
        // while the consumer is slow.
        std::thread::sleep(Duration::from_millis(50));
        let ids: Vec<String> = poller
            .map(|t| t.identifier().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn buffered_handoff() {
        let mut wire = Vec::new();
        for n in 0..3 {
            wire.extend_from_slice(&framed(&body(n)));
        }
        let cfg = PollConfig {
            handoff_capacity: 4,
            thread_name: "p1-test".to_string(),
            ..PollConfig::default()
        };

        let poller = poll_with_config(Cursor::new(wire), cfg).unwrap();
        // With room in the queue the reader runs to completion on its own.
        std::thread::sleep(Duration::from_millis(50));
        let received: Vec<Telegram> = std::iter::from_fn(|| poller.recv()).collect();
        assert_eq!(received.len(), 3);
        assert_eq!(poller.finish().unwrap().telegrams, 3);
    }

    #[test]
    #[cfg(unix)]
    fn recv_timeout_on_idle_source() {
        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let poller = poll(left).unwrap();

        let err = poller.recv_timeout(Duration::from_millis(20)).unwrap_err();
        assert_eq!(err, RecvTimeoutError::Timeout);
        assert!(format!("{poller:?}").contains("running: true"));
    }

    #[test]
    fn recv_timeout_after_end() {
        let poller = poll(Cursor::new(Vec::<u8>::new())).unwrap();
        let err = poller.recv_timeout(Duration::from_secs(5)).unwrap_err();
        assert_eq!(err, RecvTimeoutError::Disconnected);
    }

    #[test]
    fn dropping_consumer_stops_reader() {
        let mut wire = Vec::new();
        for n in 0..10 {
            wire.extend_from_slice(&framed(&body(n)));
        }
        let mut poller = poll(Cursor::new(wire)).unwrap();
        assert!(poller.next().is_some());

        // The reader is blocked handing over telegram 1; finishing releases it.
        let stats = poller.finish().unwrap();
        assert!(stats.telegrams >= 2);
        assert!(stats.telegrams < 10);
    }

    #[test]
    fn fatal_read_error_surfaces_from_finish() {
        let cfg = PollConfig {
            reader: ReaderConfig {
                max_consecutive_read_errors: 2,
                ..ReaderConfig::default()
            },
            ..PollConfig::default()
        };
        let mut poller = poll_with_config(Broken, cfg).unwrap();

        assert!(poller.next().is_none());
        assert!(matches!(poller.finish(), Err(FrameError::Io(_))));
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device unplugged"))
        }
    }
}
