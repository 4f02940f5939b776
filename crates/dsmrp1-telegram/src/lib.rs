//! DSMR P1 telegram framing, validation and parsing.
//!
//! A smart meter's P1 port emits a telegram every few seconds:
//! - a `/` header line naming the meter, then a blank line
//! - one `<code>(<value>)...` record per line
//! - `!` followed by a CRC16 of everything from `/` through `!`
//!
//! [`TelegramReader`] and [`poll`] turn a raw byte stream into validated
//! [`Telegram`]s; [`Telegram::parse`] turns one into ordered [`Records`].

pub mod checksum;
pub mod codec;
pub mod error;
pub mod poll;
pub mod reader;
pub mod reading;
pub mod telegram;
pub mod value;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use checksum::{checksum, format_checksum, P1_CRC16};
pub use codec::{
    decode_frame, encode_frame, ReaderConfig, DEFAULT_MAX_CONSECUTIVE_READ_ERRORS,
    DEFAULT_MAX_TELEGRAM_SIZE,
};
pub use error::{
    FrameError, ReadingError, Result, StructureError, TimestampFormatError, ValueFormatError,
};
pub use poll::{poll, poll_with_config, PollConfig, Poller};
pub use reader::{ReaderStats, TelegramReader};
pub use reading::{obis, Reading, TimedQuantity};
pub use telegram::{Records, Telegram};
pub use value::{
    parse_timestamp, parse_timestamp_in, parse_value_with_unit, Quantity, TimezonePolicy, Zone,
};

#[cfg(feature = "async")]
pub use tokio_codec::{telegram_stream, TelegramCodec};
