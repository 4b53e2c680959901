//! Repacks bytes into 13-bit groups and back.
//!
//! The byte stream is read most-significant bit first and cut into 13-bit
//! groups. Each group is stored as a pair of "units": a 5-bit unit holding the
//! top bits of the group, followed by an 8-bit unit holding the rest. A pair
//! therefore never exceeds `0x1FFF`, which fits into two base-94 digits.
//!
//! The bits that are left over after the last full group (the residue,
//! `(8 * byte_len) % 13`) are stored in a tail of one or two units:
//!
//! | residue | tail                          |
//! |---------|-------------------------------|
//! | 0       | `[0]`                         |
//! | 1..=6   | `[last & 0x3F]`               |
//! | 7..=8   | `[0, last]`                   |
//! | 9..=12  | `[second_last & 0x0F, last]`  |
//!
//! The tail length follows from the parity of the unit count, which in turn
//! lets the residue and the original byte length be recovered from the unit
//! count alone. An empty input packs to no units at all.

use arrayvec::ArrayVec;

/// Bits per group.
const GROUP_BITS: u32 = 13;

/// Bits per byte, and per 8-bit unit.
const BYTE_BITS: u32 = 8;

/// Mask for the 5-bit unit of a pair.
const HIGH_UNIT_MASK: u8 = 0x1F;

/// How the leftover bits after the last full group are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    /// No bits left; a single zero unit.
    Empty,
    /// 1 to 6 bits left, all in the last byte; a single unit.
    Short,
    /// 7 or 8 bits left, all in the last byte; a zero unit and the last byte.
    Byte,
    /// 9 to 12 bits left, spread over the last two bytes.
    Split,
}

impl Tail {
    const fn for_residue(residue: u8) -> Self {
        match residue {
            0 => Self::Empty,
            1..=6 => Self::Short,
            7..=8 => Self::Byte,
            _ => Self::Split,
        }
    }

    const fn len(self) -> usize {
        match self {
            Self::Empty | Self::Short => 1,
            Self::Byte | Self::Split => 2,
        }
    }

    /// Builds the tail units for the end of `bytes`.
    fn units(self, bytes: &[u8]) -> ArrayVec<u8, 2> {
        let mut tail = ArrayVec::new();
        match (self, bytes) {
            (Self::Empty, _) => tail.push(0),
            (Self::Short, [.., last]) => tail.push(last & 0x3F),
            (Self::Byte, [.., last]) => tail.extend([0, *last]),
            (Self::Split, [.., second_last, last]) => tail.extend([second_last & 0x0F, *last]),
            _ => unreachable!("tail {self:?} does not fit {} bytes", bytes.len()),
        }
        tail
    }
}

/// The shape of a packed buffer: how many full groups it holds and how many
/// bits are left over.
///
/// This is the single source of truth for the length arithmetic in both
/// directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    groups: usize,
    residue: u8,
}

impl Layout {
    const EMPTY: Self = Self {
        groups: 0,
        residue: 0,
    };

    /// Gets the layout that packing `byte_len` bytes produces.
    #[expect(clippy::cast_possible_truncation, reason = "residue is less than 13")]
    pub const fn for_byte_len(byte_len: usize) -> Self {
        // 8 * (13q + r) = 104q + 8r, split up so that huge lengths don't overflow
        let (whole, rest) = (byte_len / 13, byte_len % 13);
        Self {
            groups: whole * 8 + rest * 8 / 13,
            residue: (rest * 8 % 13) as u8,
        }
    }

    /// Gets the layout of a packed buffer with `unit_len` units.
    ///
    /// Returns [`None`] if packing never produces that many units.
    #[expect(clippy::cast_possible_truncation, reason = "value is less than 8")]
    pub const fn for_unit_len(unit_len: usize) -> Option<Self> {
        if unit_len == 0 {
            return Some(Self::EMPTY);
        }

        let tail_len = if unit_len % 2 == 1 { 1 } else { 2 };
        let groups = (unit_len - tail_len) / 2;

        // bits the full groups leave in a partially filled last byte
        let partial = ((groups % 8) * 13 % 8) as u8;
        let mut residue = (8 - partial) % 8;
        if tail_len == 2 && residue < 7 {
            residue += 8;
        }

        let layout = Self { groups, residue };
        if residue < 13 && layout.unit_len() == unit_len {
            Some(layout)
        } else {
            None
        }
    }

    const fn is_empty(self) -> bool {
        self.groups == 0 && self.residue == 0
    }

    const fn tail(self) -> Tail {
        Tail::for_residue(self.residue)
    }

    /// Gets the amount of units in the packed buffer.
    pub const fn unit_len(self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.groups * 2 + self.tail().len()
        }
    }

    /// Gets the amount of bytes in the unpacked buffer.
    pub const fn byte_len(self) -> usize {
        (self.groups / 8) * 13 + ((self.groups % 8) * 13 + self.residue as usize) / 8
    }
}

/// A small MSB-first bit queue.
///
/// Never holds more than 20 bits: at most 7 bits are left over between
/// pushes, and a push adds at most 13.
#[derive(Debug, Default)]
struct BitWindow {
    bits: u32,
    len: u32,
}

impl BitWindow {
    /// Appends the low `width` bits of `value`.
    fn push(&mut self, value: u32, width: u32) {
        debug_assert!(self.len + width < u32::BITS, "bit window overflow");
        self.bits = (self.bits << width) | (value & mask(width));
        self.len += width;
    }

    /// Takes the oldest `width` bits, if there are that many.
    fn pop(&mut self, width: u32) -> Option<u32> {
        let remaining = self.len.checked_sub(width)?;
        let value = self.bits >> remaining;
        self.bits &= mask(remaining);
        self.len = remaining;
        Some(value)
    }

    #[expect(clippy::cast_possible_truncation, reason = "pop returns 8 bits")]
    fn drain_bytes(&mut self, out: &mut Vec<u8>) {
        while let Some(byte) = self.pop(BYTE_BITS) {
            out.push(byte as u8);
        }
    }
}

const fn mask(width: u32) -> u32 {
    (1 << width) - 1
}

/// Packs bytes into a unit buffer.
pub fn pack(bytes: &[u8]) -> Vec<u8> {
    let layout = Layout::for_byte_len(bytes.len());
    let mut units = Vec::with_capacity(layout.unit_len());
    if layout.is_empty() {
        return units;
    }

    let mut window = BitWindow::default();
    for &byte in bytes {
        window.push(u32::from(byte), BYTE_BITS);
        while let Some(group) = window.pop(GROUP_BITS) {
            let [_, _, high, low] = group.to_be_bytes();
            units.extend([high, low]);
        }
    }

    debug_assert_eq!(window.len, u32::from(layout.residue), "residue must be left over");
    units.extend(layout.tail().units(bytes));
    debug_assert_eq!(units.len(), layout.unit_len(), "unit count must match layout");
    units
}

/// Unpacks a unit buffer back into bytes.
///
/// # Panics
///
/// Panics if the length of `units` is one [`pack`] never produces.
pub fn unpack(units: &[u8]) -> Vec<u8> {
    let Some(layout) = Layout::for_unit_len(units.len()) else {
        panic!("{} units cannot have been produced by packing", units.len());
    };

    let mut bytes = Vec::with_capacity(layout.byte_len());
    if layout.is_empty() {
        return bytes;
    }

    let (pairs, tail) = units.split_at(layout.groups * 2);
    let (pairs, _) = pairs.as_chunks::<2>();

    let mut window = BitWindow::default();
    for &[high, low] in pairs {
        debug_assert!(high <= HIGH_UNIT_MASK, "5-bit unit out of range: {high}");
        let group = u16::from_be_bytes([high & HIGH_UNIT_MASK, low]);
        window.push(u32::from(group), GROUP_BITS);
        window.drain_bytes(&mut bytes);
    }

    // the tail may repeat bits of the last group, so only the low `residue`
    // bits are kept. `push` does the masking.
    let tail = tail
        .iter()
        .fold(0, |acc, &unit| (acc << BYTE_BITS) | u32::from(unit));
    window.push(tail, u32::from(layout.residue));
    window.drain_bytes(&mut bytes);

    debug_assert_eq!(window.len, 0, "no bits may be left over");
    debug_assert_eq!(bytes.len(), layout.byte_len(), "byte count must match layout");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_bands() {
        // one input per band, residue in the comment
        const CASES: &[(&[u8], &[u8])] = &[
            // 13 bytes, 0
            (&[0xFF; 13], &[
                0x1F, 0xFF, 0x1F, 0xFF, 0x1F, 0xFF, 0x1F, 0xFF, 0x1F, 0xFF, 0x1F, 0xFF, 0x1F, 0xFF,
                0x1F, 0xFF, 0x00,
            ]),
            // 2 bytes, 3
            (&[0x01, 0x02], &[0x00, 0x20, 0x02]),
            // 4 bytes, 6
            (&[0xDE, 0xAD, 0xBE, 0xEF], &[0x1B, 0xD5, 0x16, 0xFB, 0x2F]),
            // 1 byte, 8
            (&[0xFF], &[0x00, 0xFF]),
            // 3 bytes, 11
            (&[0xAB, 0xAB, 0xAB], &[0x15, 0x75, 0x0B, 0xAB]),
        ];

        for &(bytes, units) in CASES {
            assert_eq!(pack(bytes), units, "packing {bytes:02X?}");
            assert_eq!(unpack(units), bytes, "unpacking {units:02X?}");
        }
    }

    #[test]
    fn layout_matches_pack() {
        for byte_len in 0..2000 {
            let bytes = vec![0xA5; byte_len];
            let units = pack(&bytes);
            let layout = Layout::for_byte_len(byte_len);

            assert_eq!(units.len(), layout.unit_len(), "unit len for {byte_len} bytes");
            assert_eq!(Layout::for_unit_len(units.len()), Some(layout), "layout for {byte_len} bytes");
            assert_eq!(layout.byte_len(), byte_len, "byte len for {byte_len} bytes");
        }
    }

    #[test]
    fn impossible_unit_lens() {
        // 1 unit would be an empty input, which packs to nothing.
        // 5 pairs with a 1-unit tail would need a residue of 7.
        // 2 or 7 pairs with a 2-unit tail would need a residue above 12.
        for unit_len in [1, 11, 6, 16] {
            assert_eq!(Layout::for_unit_len(unit_len), None, "{unit_len} units");
        }
    }

    #[test]
    #[should_panic = "cannot have been produced by packing"]
    fn unpack_impossible_len_panics() {
        unpack(&[0]);
    }

    #[test]
    fn huge_byte_len_does_not_overflow() {
        let layout = Layout::for_byte_len(usize::MAX);
        assert!(layout.residue < 13, "residue must be in range");
    }
}
