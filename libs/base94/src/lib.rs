//! Encodes binary data as printable ASCII text and converts that text back
//! into binary data.
//!
//! The format uses an [`Alphabet`] of 94 symbols and packs every 13 bits of
//! input into 2 symbols, so it needs about 1.23 symbols per byte, compared to
//! base64's 1.33.
//!
//! Encoding happens in two steps: the bytes are first repacked into a "unit
//! buffer" of 13-bit groups (see [`encode_units`]), which is then written as
//! symbols. Decoding does the inverse. The unit buffer does not depend on the
//! alphabet.
//!
//! There is a pair of writer-based [`encode`] and [`decode`] functions, as
//! well as [`to_string`] and [`from_str`] convenience functions.
//!
//! # Examples
//!
//! ```
//! use base94::Alphabet;
//!
//! let text = base94::to_string(&Alphabet::STANDARD, b"Hello, World!");
//! assert_eq!(text, r#"Oyx7ylp81"+/q+BN0"#);
//!
//! let back = base94::from_str(&Alphabet::STANDARD, &text)?;
//! assert_eq!(back, b"Hello, World!");
//! # Ok::<(), base94::Error>(())
//! ```

// for benchmarks
#[cfg(test)]
use {base64 as _, criterion as _};

use std::{fmt, io};

pub mod alphabet;
mod symbols;
mod transcode;

pub use alphabet::{Alphabet, AlphabetError};
use transcode::Layout;

/// Error decoding base94 text.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A character is not a symbol of the alphabet.
    #[error("illegal character {symbol:?} at position {position}")]
    IllegalCharacter { symbol: char, position: usize },
    /// No data encodes to this many symbols.
    #[error("no data encodes to {0} symbols")]
    LenMismatch(usize),
    /// The symbols starting at this position decode to a value out of range.
    #[error("symbol value at position {position} out of range for format")]
    ContentRange { position: usize },
    /// The written buffer returned an error.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The exact amount of symbols that encoding `byte_len` bytes produces.
///
/// This can be used to reserve space in a buffer.
#[must_use]
pub const fn encoded_len(byte_len: usize) -> usize {
    Layout::for_byte_len(byte_len).unit_len()
}

/// The exact amount of bytes that `symbol_count` symbols decode to.
///
/// Returns [`None`] if no data encodes to that many symbols.
#[must_use]
pub const fn decoded_len(symbol_count: usize) -> Option<usize> {
    match Layout::for_unit_len(symbol_count) {
        Some(layout) => Some(layout.byte_len()),
        None => None,
    }
}

/// Repacks bytes into the intermediate unit buffer.
///
/// Every 13 bits become a pair of a 5-bit and an 8-bit unit, followed by a
/// tail of 1 or 2 units for the remaining bits. Use [`decode_units`] to
/// reverse the operation.
#[must_use]
pub fn encode_units(bytes: &[u8]) -> Vec<u8> {
    transcode::pack(bytes)
}

/// Unpacks an intermediate unit buffer back into bytes.
///
/// # Panics
///
/// Panics if `units` has a length that [`encode_units`] never produces.
#[must_use]
pub fn decode_units(units: &[u8]) -> Vec<u8> {
    transcode::unpack(units)
}

/// Encodes bytes as base94, returning a [`String`] with the result.
///
/// This is equivalent to using [`encode`] with a [`String`].
///
/// Use [`from_str`] to reverse the operation.
#[must_use]
pub fn to_string(alphabet: &Alphabet, bytes: &[u8]) -> String {
    let mut result = String::with_capacity(encoded_len(bytes.len()));
    encode(&mut result, alphabet, bytes).expect("write to String cannot fail");
    result
}

/// Encodes bytes as base94, writing the symbols to a buffer.
///
/// Use [`decode`] to reverse the operation.
///
/// # Errors
///
/// Returns [`Err`] if and only if `writer` returns [`Err`].
pub fn encode<W: fmt::Write>(mut writer: W, alphabet: &Alphabet, bytes: &[u8]) -> fmt::Result {
    let units = transcode::pack(bytes);
    symbols::write_units(&mut writer, alphabet, &units)
}

/// Decodes a string holding base94 data.
///
/// No partial output is produced: either all of `input` is valid, or an error
/// is returned.
///
/// # Errors
///
/// Returns [`Err`] if `input` contains characters outside the alphabet or
/// cannot be the output of encoding any data.
pub fn from_str(alphabet: &Alphabet, input: &str) -> Result<Vec<u8>, Error> {
    let units = symbols::read_units(alphabet, input)?;
    Ok(transcode::unpack(&units))
}

/// Decodes a string holding base94 data, writing the bytes to a buffer.
///
/// Nothing is written if `input` is invalid.
///
/// # Errors
///
/// Returns [`Err`] if `input` is invalid, or `writer` returns [`Err`].
pub fn decode<W: io::Write>(mut writer: W, alphabet: &Alphabet, input: &str) -> Result<(), Error> {
    let bytes = from_str(alphabet, input)?;
    writer.write_all(&bytes)?;
    Ok(())
}
