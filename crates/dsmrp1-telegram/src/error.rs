/// Errors raised while locating and validating telegrams in a byte stream.
///
/// Apart from [`FrameError::Io`], these are recoverable: the reader logs them,
/// drops the offending frame and resumes scanning.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The checksum line after `!` is not 4 hex digits plus CR LF.
    #[error("unexpected checksum trailer length ({len} bytes, expected 6)")]
    TrailerLength { len: usize },

    /// The checksum on the wire does not match the computed one.
    #[error("checksum mismatch: wire {wire} vs computed {computed}")]
    ChecksumMismatch { wire: String, computed: String },

    /// No end delimiter within the configured maximum telegram size.
    #[error("telegram too large ({size} bytes buffered, max {max})")]
    TooLarge { size: usize, max: usize },

    /// The input did not contain a complete telegram.
    #[error("incomplete telegram")]
    Incomplete,

    /// An I/O error occurred while reading the byte source.
    #[error("telegram I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing the body of a validated telegram.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    /// The telegram is not valid UTF-8 text.
    #[error("telegram is not valid text: {0}")]
    InvalidText(#[from] std::str::Utf8Error),

    #[error("unexpected number of lines in telegram ({count})")]
    TooFewLines { count: usize },

    #[error("expected '/' missing in first line of telegram")]
    MissingStartDelimiter,

    #[error("missing separating blank line between identifier and data")]
    MissingSeparatorLine,

    /// A data line has no `(` separating the identifier code from its values.
    #[error("expected '(' not found on data line {line}")]
    MissingOpenParen { line: usize },

    #[error("expected ')' at end of data line {line}")]
    UnterminatedValue { line: usize },

    #[error("telegram contains no data lines")]
    NoRecords,

    #[error("header is not terminated by a blank line")]
    MissingHeaderTerminator,

    #[error("header too short ({len} bytes) to hold an identifier")]
    HeaderTooShort { len: usize },
}

/// Errors raised by [`parse_value_with_unit`](crate::parse_value_with_unit).
#[derive(Debug, thiserror::Error)]
pub enum ValueFormatError {
    /// The input is not of the form `<number>*<unit>`.
    #[error("expected value and unit separated by '*': {input:?}")]
    MissingUnit { input: String },

    #[error("invalid number {input:?}: {source}")]
    InvalidNumber {
        input: String,
        source: std::num::ParseFloatError,
    },
}

/// Errors raised by [`parse_timestamp`](crate::parse_timestamp).
#[derive(Debug, thiserror::Error)]
pub enum TimestampFormatError {
    #[error("empty timestamp")]
    Empty,

    /// The last character is neither `S` (summer) nor `W` (winter).
    #[error("missing DST indicator in timestamp {input:?} (found {indicator:?})")]
    InvalidDstIndicator { input: String, indicator: char },

    #[error("invalid timestamp {input:?}: {source}")]
    Invalid {
        input: String,
        source: chrono::ParseError,
    },
}

/// Errors raised while extracting a [`Reading`](crate::Reading) from records.
#[derive(Debug, thiserror::Error)]
pub enum ReadingError {
    #[error("{code}: {source}")]
    Value {
        code: &'static str,
        source: ValueFormatError,
    },

    #[error("{code}: {source}")]
    Timestamp {
        code: &'static str,
        source: TimestampFormatError,
    },

    /// The record has fewer values than the code requires.
    #[error("{code}: expected at least {expected} value(s), found {found}")]
    MissingValue {
        code: &'static str,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
