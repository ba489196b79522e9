//! HTTP Range request parsing module
//!
//! Single byte-range parsing for partial downloads. Multi-range requests are
//! rejected outright, never partially honored.

use std::num::IntErrorKind;
use thiserror::Error;

/// A validated, inclusive byte interval over a resource.
///
/// Only [`parse_range_header`] constructs it, so `start <= end < total_size`
/// always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
    total_size: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    #[inline]
    pub const fn start(&self) -> u64 {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> u64 {
        self.end
    }

    #[inline]
    pub const fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of bytes covered by the range (`end - start + 1`)
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of the `Content-Range` header for a 206 response
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }
}

/// Why a Range header could not be honored. Every variant maps to 416.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range unit is not bytes")]
    UnsupportedUnit,
    #[error("empty range specifier")]
    Empty,
    #[error("multiple ranges are not supported")]
    MultiRange,
    #[error("malformed range specifier")]
    Malformed,
    #[error("range not satisfiable")]
    Unsatisfiable,
}

/// Parse an HTTP Range header value against a file of `file_size` bytes
///
/// Supported formats:
/// - `bytes=start-end` - Specific range, end clamped to the last byte
/// - `bytes=start-` - From start to end of file
/// - `bytes=-suffix` - Last suffix bytes, clamped to the whole file
///
/// # Examples
/// ```
/// use fileshare::http::range::{parse_range_header, RangeError};
///
/// let range = parse_range_header("bytes=0-99", 1000).unwrap();
/// assert_eq!(range.len(), 100);
///
/// assert_eq!(parse_range_header("bytes=0-1,5-9", 1000), Err(RangeError::MultiRange));
/// ```
pub fn parse_range_header(header: &str, file_size: u64) -> Result<ByteRange, RangeError> {
    let spec = header
        .strip_prefix("bytes=")
        .ok_or(RangeError::UnsupportedUnit)?;

    if spec.trim().is_empty() {
        return Err(RangeError::Empty);
    }
    if spec.contains(',') {
        return Err(RangeError::MultiRange);
    }

    let (start_str, end_str) = spec.split_once('-').ok_or(RangeError::Malformed)?;
    if end_str.contains('-') {
        return Err(RangeError::Malformed);
    }
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    let (start, end) = if start_str.is_empty() {
        parse_suffix(end_str, file_size)?
    } else {
        let start = parse_offset(start_str)?;
        let end = if end_str.is_empty() {
            file_size.saturating_sub(1)
        } else {
            parse_offset(end_str)?
        };
        (start, end)
    };

    validate(start, end, file_size)
}

/// Suffix form "-N": the last N bytes
fn parse_suffix(suffix_str: &str, file_size: u64) -> Result<(u64, u64), RangeError> {
    let suffix = parse_offset(suffix_str)?;
    if suffix == 0 || file_size == 0 {
        return Err(RangeError::Unsatisfiable);
    }
    let suffix = suffix.min(file_size);
    Ok((file_size - suffix, file_size - 1))
}

/// A run of ASCII digits; values past `u64::MAX` saturate so callers clamp them
fn parse_offset(value: &str) -> Result<u64, RangeError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed);
    }
    match value.parse::<u64>() {
        Ok(n) => Ok(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(u64::MAX),
        Err(_) => Err(RangeError::Malformed),
    }
}

fn validate(start: u64, end: u64, file_size: u64) -> Result<ByteRange, RangeError> {
    if start >= file_size || end < start {
        return Err(RangeError::Unsatisfiable);
    }
    Ok(ByteRange {
        start,
        end: end.min(file_size - 1),
        total_size: file_size,
    })
}
