use bytes::{Bytes, BytesMut};
use indexmap::IndexMap;
use tracing::debug;

use crate::checksum::checksum;
use crate::codec::decode_frame;
use crate::error::{FrameError, StructureError};

/// Identifier codes mapped to their parenthesised values, in telegram order.
pub type Records = IndexMap<String, Vec<String>>;

const LINE_END: &str = "\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Bytes between `/` and the identifier (`/XXXZ`: manufacturer + baud rate char).
const IDENTIFIER_OFFSET: usize = 5;

/// One complete P1 telegram whose checksum has been verified.
///
/// Holds the bytes from the leading `/` through the closing `!`; the checksum
/// line is not kept. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    raw: Bytes,
}

impl Telegram {
    /// Only called once the checksum has been verified.
    pub(crate) fn from_validated(raw: Bytes) -> Self {
        Self { raw }
    }

    /// Validate a complete frame including its checksum line.
    ///
    /// Leading noise is skipped. Fails with [`FrameError::Incomplete`] if no
    /// complete frame is present.
    pub fn from_wire(wire: &[u8]) -> Result<Self, FrameError> {
        let mut buf = BytesMut::from(wire);
        decode_frame(&mut buf, usize::MAX)?.ok_or(FrameError::Incomplete)
    }

    /// The raw telegram bytes, `/` through `!`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The checksum of the telegram body, as verified on receipt.
    pub fn checksum(&self) -> u16 {
        checksum(&self.raw)
    }

    /// The meter identification from the header line.
    ///
    /// The header reads `/XXXZ<identifier>` followed by a blank line; the
    /// 5-byte prefix is skipped. A header shorter than the prefix, such as
    /// `/HDR`, has no identifier and yields [`StructureError::HeaderTooShort`];
    /// [`parse`](Self::parse) still works on such a telegram.
    pub fn identifier(&self) -> Result<&str, StructureError> {
        let end = self
            .raw
            .windows(HEADER_END.len())
            .position(|w| w == HEADER_END)
            .ok_or(StructureError::MissingHeaderTerminator)?;
        if end < IDENTIFIER_OFFSET {
            return Err(StructureError::HeaderTooShort { len: end });
        }
        Ok(std::str::from_utf8(&self.raw[IDENTIFIER_OFFSET..end])?)
    }

    /// Parse the data lines into a code → values mapping.
    ///
    /// Each data line has the form `<code>(<value>)(<value>)...`. A code that
    /// occurs twice keeps the values of its last occurrence.
    ///
    /// Stricter than a plain line split: a data line that does not end in `)`
    /// is rejected with [`StructureError::UnterminatedValue`] instead of having
    /// its last character dropped, and a telegram without data lines is
    /// [`StructureError::NoRecords`].
    pub fn parse(&self) -> Result<Records, StructureError> {
        let text = std::str::from_utf8(&self.raw)?;
        let lines: Vec<&str> = text.split(LINE_END).collect();

        if lines.len() < 2 {
            return Err(StructureError::TooFewLines { count: lines.len() });
        }
        if !lines[0].starts_with('/') {
            return Err(StructureError::MissingStartDelimiter);
        }
        if !lines[1].is_empty() {
            return Err(StructureError::MissingSeparatorLine);
        }

        // Skip the header and the blank line; the last line only holds '!'.
        let data = lines.get(2..lines.len() - 1).unwrap_or_default();
        if data.is_empty() {
            return Err(StructureError::NoRecords);
        }

        let mut records = Records::with_capacity(data.len());
        for (i, line) in data.iter().enumerate() {
            let line_no = i + 2;
            let open = line
                .find('(')
                .ok_or(StructureError::MissingOpenParen { line: line_no })?;
            let (code, rest) = line.split_at(open);
            let inner = rest[1..]
                .strip_suffix(')')
                .ok_or(StructureError::UnterminatedValue { line: line_no })?;
            let values = inner.split(")(").map(str::to_string).collect();

            if records.insert(code.to_string(), values).is_some() {
                debug!(code, line = line_no, "duplicate identifier code, keeping last");
            }
        }

        Ok(records)
    }
}

impl AsRef<[u8]> for Telegram {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

impl From<Telegram> for Bytes {
    fn from(telegram: Telegram) -> Self {
        telegram.raw
    }
}
