//! Byte ranges.
//!
//! A [`ByteRange`] represents a byte range relative to the start or end of a byte sequence.
//! A byte range has an offset and optional length, which if omitted means to read all remaining bytes.
//!
//! Byte ranges are used for partial reads from [stores](crate::storage) and for addressing [virtual chunks](crate::array::chunk_manifest) inside foreign files.

use std::{
    io::{Read, Seek, SeekFrom},
    ops::Range,
};

use thiserror::Error;

/// A byte offset.
pub type ByteOffset = u64;

/// A byte length.
pub type ByteLength = u64;

/// A byte range.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ByteRange {
    /// A byte range from the start.
    ///
    /// If the byte length is [`None`], reads to the end of the value.
    FromStart(ByteOffset, Option<ByteLength>),
    /// A byte range from the end.
    ///
    /// If the byte length is [`None`], reads to the start of the value.
    FromEnd(ByteOffset, Option<ByteLength>),
}

impl ByteRange {
    /// Return the start of a byte range. `size` is the size of the entire bytes.
    #[must_use]
    pub fn start(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, _) => *offset,
            Self::FromEnd(offset, length) => {
                length.map_or(0, |length| size.saturating_sub(offset + length))
            }
        }
    }

    /// Return the exclusive end of a byte range. `size` is the size of the entire bytes.
    #[must_use]
    pub fn end(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, length) => length.map_or(size, |length| offset + length),
            Self::FromEnd(offset, _) => size.saturating_sub(*offset),
        }
    }

    /// Return the length of a byte range. `size` is the size of the entire bytes.
    #[must_use]
    pub fn length(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, None) | Self::FromEnd(offset, None) => {
                size.saturating_sub(*offset)
            }
            Self::FromStart(_, Some(length)) | Self::FromEnd(_, Some(length)) => *length,
        }
    }

    /// Convert the byte range to a [`Range<u64>`].
    #[must_use]
    pub fn to_range(&self, size: u64) -> Range<u64> {
        self.start(size)..self.end(size)
    }

    /// Returns true if the byte range lies within bytes of length `size`.
    #[must_use]
    pub fn is_valid(&self, size: u64) -> bool {
        let (Self::FromStart(offset, length) | Self::FromEnd(offset, length)) = self;
        offset
            .checked_add(length.unwrap_or(0))
            .is_some_and(|end| end <= size)
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::FromStart(offset, length) => write!(
                f,
                "{}..{}",
                if offset == &0 {
                    String::new()
                } else {
                    offset.to_string()
                },
                length.map_or(String::new(), |length| (offset + length).to_string())
            ),
            Self::FromEnd(offset, length) => write!(
                f,
                "{}..{}",
                length.map_or(String::new(), |length| format!("-{}", offset + length)),
                if offset == &0 {
                    String::new()
                } else {
                    format!("-{offset}")
                }
            ),
        }
    }
}

/// An invalid byte range error.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid byte range {0} for bytes of length {1}")]
pub struct InvalidByteRangeError(ByteRange, u64);

impl InvalidByteRangeError {
    /// Create a new [`InvalidByteRangeError`].
    #[must_use]
    pub fn new(byte_range: ByteRange, bytes_len: u64) -> Self {
        Self(byte_range, bytes_len)
    }
}

fn validate_byte_ranges(
    byte_ranges: &[ByteRange],
    bytes_len: u64,
) -> Result<(), InvalidByteRangeError> {
    for byte_range in byte_ranges {
        if !byte_range.is_valid(bytes_len) {
            return Err(InvalidByteRangeError(*byte_range, bytes_len));
        }
    }
    Ok(())
}

/// Extract byte ranges from bytes.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if any bytes are requested beyond the end of `bytes`.
pub fn extract_byte_ranges(
    bytes: &[u8],
    byte_ranges: &[ByteRange],
) -> Result<Vec<Vec<u8>>, InvalidByteRangeError> {
    let size = bytes.len() as u64;
    validate_byte_ranges(byte_ranges, size)?;
    byte_ranges
        .iter()
        .map(|byte_range| {
            let range = byte_range.to_range(size);
            let start =
                usize::try_from(range.start).map_err(|_| InvalidByteRangeError(*byte_range, size))?;
            let end =
                usize::try_from(range.end).map_err(|_| InvalidByteRangeError(*byte_range, size))?;
            Ok(bytes[start..end].to_vec())
        })
        .collect()
}

/// Extract byte ranges from bytes implementing [`Read`] and [`Seek`].
///
/// `size` is the total length of `bytes`.
///
/// # Errors
/// Returns a [`std::io::Error`] if there is an error reading or seeking from `bytes`.
/// This includes a byte range that is out-of-bounds of `bytes`, which is reported as [`std::io::ErrorKind::UnexpectedEof`].
pub fn extract_byte_ranges_read_seek<T: Read + Seek>(
    bytes: &mut T,
    size: u64,
    byte_ranges: &[ByteRange],
) -> std::io::Result<Vec<Vec<u8>>> {
    let mut out = Vec::with_capacity(byte_ranges.len());
    for byte_range in byte_ranges {
        if !byte_range.is_valid(size) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                InvalidByteRangeError(*byte_range, size),
            ));
        }
        let length = usize::try_from(byte_range.length(size))
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
        bytes.seek(SeekFrom::Start(byte_range.start(size)))?;
        let mut data = vec![0; length];
        bytes.read_exact(&mut data)?;
        out.push(data);
    }
    Ok(out)
}
