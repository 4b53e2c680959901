//! The 94-symbol alphabet used to print encoded data.
//!
//! An alphabet is an ordering of the printable ASCII characters `!` through
//! `~`. Since there are exactly 94 of those, every valid alphabet contains all
//! of them; only the order differs. The order is significant: the same bytes
//! encode to different text under different alphabets.

use std::fmt;
use std::str::FromStr;

/// Amount of symbols in an alphabet.
pub const SIZE: usize = 94;

/// The symbols of the [standard alphabet](Alphabet::STANDARD), in order.
///
/// Changing this changes the output of every encoding done with it, so it is
/// fixed for compatibility with already encoded data.
pub const STANDARD_SYMBOLS: &[u8; SIZE] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz~`!@#$%^&*-_=+|\\;:\"'/?.>,<(){}[]";

/// Lowest valid symbol, `!`.
const MIN_SYMBOL: u8 = 0x21;

/// Highest valid symbol, `~`.
const MAX_SYMBOL: u8 = 0x7E;

/// Marks code points in the reverse table that aren't symbols.
const NO_INDEX: u8 = u8::MAX;

/// Error constructing an [`Alphabet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AlphabetError {
    /// The alphabet didn't have exactly [`SIZE`] symbols.
    #[error("alphabet must have exactly 94 symbols, but has {0}")]
    InvalidSize(usize),
    /// A symbol wasn't printable ASCII or was already present earlier.
    #[error("invalid or duplicate symbol {symbol:?} at index {index}")]
    InvalidOrDuplicateSymbol { symbol: char, index: usize },
}

/// An ordered set of 94 symbols along with its reverse lookup.
///
/// This is plain immutable data, so a single alphabet can be shared freely
/// across threads and calls.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Alphabet {
    forward: [u8; SIZE],
    reverse: [u8; 0x80],
}

impl Alphabet {
    /// The standard alphabet: digits, upper- and lowercase letters, then
    /// punctuation. See [`STANDARD_SYMBOLS`].
    pub const STANDARD: Self = match Self::new(STANDARD_SYMBOLS) {
        Ok(alphabet) => alphabet,
        Err(_) => panic!("standard alphabet must be valid"),
    };

    /// Creates an alphabet from its symbols, in order.
    ///
    /// # Errors
    ///
    /// Returns [`AlphabetError::InvalidSize`] if `symbols` does not have
    /// exactly [`SIZE`] elements and [`AlphabetError::InvalidOrDuplicateSymbol`]
    /// if any of them is outside `!` to `~` or appears more than once.
    #[expect(clippy::cast_possible_truncation, reason = "index is less than SIZE")]
    pub const fn new(symbols: &[u8]) -> Result<Self, AlphabetError> {
        if symbols.len() != SIZE {
            return Err(AlphabetError::InvalidSize(symbols.len()));
        }

        let mut forward = [0; SIZE];
        let mut reverse = [NO_INDEX; 0x80];

        let mut index = 0;
        while index < SIZE {
            let symbol = symbols[index];
            if !matches!(symbol, MIN_SYMBOL..=MAX_SYMBOL) || reverse[symbol as usize] != NO_INDEX {
                return Err(AlphabetError::InvalidOrDuplicateSymbol {
                    symbol: symbol as char,
                    index,
                });
            }

            forward[index] = symbol;
            reverse[symbol as usize] = index as u8;
            index += 1;
        }

        Ok(Self { forward, reverse })
    }

    /// Gets the index of a symbol, or [`None`] if it isn't part of the
    /// alphabet.
    #[must_use]
    pub fn index_of(&self, symbol: char) -> Option<u8> {
        let code = u8::try_from(symbol).ok()?;
        self.reverse
            .get(usize::from(code))
            .copied()
            .filter(|&index| index != NO_INDEX)
    }

    /// Gets the symbol at an index, or [`None`] if the index is 94 or larger.
    #[must_use]
    pub fn symbol_at(&self, index: u8) -> Option<char> {
        self.forward.get(usize::from(index)).copied().map(char::from)
    }

    /// Gets all symbols, in order.
    #[must_use]
    pub fn symbols(&self) -> &str {
        // SAFETY: `new` only accepts printable ASCII.
        unsafe { std::str::from_utf8_unchecked(&self.forward) }
    }

    /// Gets the symbol for a digit that is known to be in range.
    ///
    /// Panics if `digit` is 94 or larger.
    pub(crate) fn symbol(&self, digit: u16) -> char {
        char::from(self.forward[usize::from(digit)])
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Alphabet").field(&self.symbols()).finish()
    }
}

impl FromStr for Alphabet {
    type Err = AlphabetError;

    /// Creates an alphabet from a string holding its symbols.
    ///
    /// The size is checked in [`char`]s, before any symbol is validated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count = s.chars().count();
        if count != SIZE {
            return Err(AlphabetError::InvalidSize(count));
        }

        // ascii-only from here on, so bytes and chars line up
        if let Some((index, symbol)) = s.chars().enumerate().find(|(_, c)| !c.is_ascii()) {
            return Err(AlphabetError::InvalidOrDuplicateSymbol { symbol, index });
        }

        Self::new(s.as_bytes())
    }
}

impl TryFrom<&str> for Alphabet {
    type Error = AlphabetError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
