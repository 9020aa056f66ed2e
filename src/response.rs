//! Interpreting responses read from an instrument.

use crate::error::{BlockMalformedError, ParseError};

/// The response to a [`Command`](crate::command::Command) run through
/// [`Channel::execute`](crate::channel::Channel::execute).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The command is not answered.
    None,
    /// A single line of text, without its terminator.
    Line(String),
    /// The payload of a block response.
    Block(Vec<u8>),
}

impl Reply {
    /// Get the line of text, if this is a [`Reply::Line`].
    pub fn line(&self) -> Option<&str> {
        match self {
            Reply::Line(line) => Some(line),
            _ => None,
        }
    }

    /// Get the block payload, if this is a [`Reply::Block`].
    pub fn block(&self) -> Option<&[u8]> {
        match self {
            Reply::Block(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Convert the raw bytes of a line into text, dropping the line terminator.
pub(crate) fn line_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// Parse response text as a floating-point number.
///
/// Surrounding whitespace is ignored. Anything other than a finite number,
/// including `NaN` and `inf`, is rejected.
///
/// ```
/// # use scpisync::response::parse_numeric;
/// assert_eq!(parse_numeric("3.14159").unwrap(), 3.14159);
/// assert_eq!(parse_numeric("+1.0E+6\n").unwrap(), 1e6);
/// assert!(parse_numeric("ERR").is_err());
/// ```
pub fn parse_numeric(text: &str) -> Result<f64, ParseError> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::new(text)),
    }
}

/// The length of a block, as announced by its header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockLength {
    /// `#<n><length>`: exactly `length` bytes follow.
    Definite(usize),
    /// `#0`: the payload runs until the line terminator.
    Indefinite,
}

/// Interpret the digit following the `#` of a block header.
///
/// Returns the number of length digits that follow (`0` for an indefinite
/// block).
pub(crate) fn block_digit_count(header: &[u8]) -> Result<usize, BlockMalformedError> {
    match header {
        [b'#', digit] if digit.is_ascii_digit() => Ok(usize::from(digit - b'0')),
        _ => Err(BlockMalformedError::new(header)),
    }
}

/// Parse the length digits of a definite block header.
pub(crate) fn block_length(
    header: &[u8],
    digits: &[u8],
) -> Result<BlockLength, BlockMalformedError> {
    if digits.is_empty() {
        return Ok(BlockLength::Indefinite);
    }
    std::str::from_utf8(digits)
        .ok()
        .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<usize>().ok())
        .map(BlockLength::Definite)
        .ok_or_else(|| BlockMalformedError::new([header, digits].concat()))
}
