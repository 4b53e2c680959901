//! Converts between unit buffers and symbol text.
//!
//! Every unit pair is read as a big-endian number below `0x2000` and written
//! as two base-94 digits, most significant first. A lone trailing unit is
//! always below 64 and is written as a single digit.

use std::fmt;

use crate::Error;
use crate::alphabet::Alphabet;
use crate::transcode::Layout;

/// The radix of the digits.
const RADIX: u16 = 94;

/// Exclusive upper bound of a unit pair.
const PAIR_LIMIT: u16 = 0x2000;

/// Exclusive upper bound of a lone trailing unit.
const LONE_LIMIT: u8 = 0x40;

/// Writes the symbols for a unit buffer.
pub fn write_units<W: fmt::Write>(writer: &mut W, alphabet: &Alphabet, units: &[u8]) -> fmt::Result {
    let (pairs, lone) = units.as_chunks::<2>();
    for &pair in pairs {
        let value = u16::from_be_bytes(pair);
        debug_assert!(value < PAIR_LIMIT, "unit pair out of range: {value:#X}");

        writer.write_char(alphabet.symbol(value / RADIX))?;
        writer.write_char(alphabet.symbol(value % RADIX))?;
    }

    if let &[unit] = lone {
        debug_assert!(unit < LONE_LIMIT, "lone unit out of range: {unit:#X}");
        writer.write_char(alphabet.symbol(u16::from(unit)))?;
    }

    Ok(())
}

/// Reads symbol text back into a unit buffer.
///
/// The result is always a valid input to [`unpack`](crate::transcode::unpack).
///
/// # Errors
///
/// In order of precedence: [`Error::IllegalCharacter`] if any character is
/// not in the alphabet, [`Error::LenMismatch`] if the symbol count cannot
/// come from any encoding, and [`Error::ContentRange`] if the digits encode a
/// value no encoding produces.
pub fn read_units(alphabet: &Alphabet, input: &str) -> Result<Vec<u8>, Error> {
    let mut units = input
        .chars()
        .enumerate()
        .map(|(position, symbol)| {
            alphabet
                .index_of(symbol)
                .ok_or(Error::IllegalCharacter { symbol, position })
        })
        .collect::<Result<Vec<u8>, Error>>()?;

    let unit_len = units.len();
    if Layout::for_unit_len(unit_len).is_none() {
        return Err(Error::LenMismatch(unit_len));
    }

    // digits are converted to units in place
    let (pairs, lone) = units.as_chunks_mut::<2>();
    for (index, pair) in pairs.iter_mut().enumerate() {
        let [high, low] = *pair;
        let value = u16::from(high) * RADIX + u16::from(low);
        if value >= PAIR_LIMIT {
            return Err(Error::ContentRange { position: index * 2 });
        }

        *pair = value.to_be_bytes();
    }

    if let &mut [unit] = lone
        && unit >= LONE_LIMIT
    {
        return Err(Error::ContentRange {
            position: unit_len - 1,
        });
    }

    Ok(units)
}
