//! Lookup tables for range-table UTF-8 validation.
//!
//! The whole UTF-8 grammar is encoded in three 16-entry tables:
//!
//! - [`FOLLOW_TABLE`] maps a byte's high nibble to the number of continuation
//!   bytes a lead byte with that nibble requires.
//! - [`RANGE_MIN`] / [`RANGE_MAX`] give the inclusive legal byte range for each
//!   [`RangeIndex`].
//!
//! Well-formed byte sequences (Unicode 6.0, Table 3-7):
//!
//! | Code Points        | First | Second | Third  | Fourth |
//! |--------------------|-------|--------|--------|--------|
//! | U+0000..U+007F     | 00..7F|        |        |        |
//! | U+0080..U+07FF     | C2..DF| 80..BF |        |        |
//! | U+0800..U+0FFF     | E0    | A0..BF | 80..BF |        |
//! | U+1000..U+CFFF     | E1..EC| 80..BF | 80..BF |        |
//! | U+D000..U+D7FF     | ED    | 80..9F | 80..BF |        |
//! | U+E000..U+FFFF     | EE..EF| 80..BF | 80..BF |        |
//! | U+10000..U+3FFFF   | F0    | 90..BF | 80..BF | 80..BF |
//! | U+40000..U+FFFFF   | F1..F3| 80..BF | 80..BF | 80..BF |
//! | U+100000..U+10FFFF | F4    | 80..8F | 80..BF | 80..BF |
//!
//! Bounds are unsigned. Kernels built on signed byte compares (SSE/AVX2) flip
//! the sign bit of both operands before comparing, see [`SIGN_FLIP`].

/// Continuation bytes required by a lead byte, indexed by high nibble.
pub const FOLLOW_TABLE: [u8; 16] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 0x00-0x7F: ASCII
    0, 0, 0, 0, // 0x80-0xBF: continuation
    1, 1, // 0xC0-0xDF: 2-byte lead
    2, // 0xE0-0xEF: 3-byte lead
    3, // 0xF0-0xFF: 4-byte lead
];

/// Inclusive lower bound per range index.
pub const RANGE_MIN: [u8; 16] = [
    0x00, 0x80, 0x80, 0x80, 0xA0, 0x80, 0x90, 0x80, 0xC2, //
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // never satisfiable
];

/// Inclusive upper bound per range index.
pub const RANGE_MAX: [u8; 16] = [
    0x7F, 0xBF, 0xBF, 0xBF, 0xBF, 0x9F, 0xBF, 0x8F, 0xF4, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // never satisfiable
];

/// Offset added to a range index when a lane is itself a lead byte.
pub const LEAD_OFFSET: u8 = 8;

/// Lead bytes whose second byte has a narrowed range, with the offset added
/// to the follower's range index.
///
/// | Lead | Follower range | Base + offset |
/// |------|----------------|---------------|
/// | E0   | A0..BF         | 2 + 2 = 4     |
/// | ED   | 80..9F         | 2 + 3 = 5     |
/// | F0   | 90..BF         | 3 + 3 = 6     |
/// | F4   | 80..8F         | 3 + 4 = 7     |
pub const SPECIAL_LEADS: [(u8, u8); 4] = [(0xE0, 2), (0xED, 3), (0xF0, 3), (0xF4, 4)];

/// XOR mask turning unsigned byte order into signed byte order.
pub const SIGN_FLIP: u8 = 0x80;

/// Continuation bytes required by `byte` if it starts a sequence.
#[inline(always)]
pub const fn follow_len(byte: u8) -> u8 {
    FOLLOW_TABLE[(byte >> 4) as usize]
}

/// Range-index offset contributed by the byte preceding a lane.
#[inline(always)]
pub const fn special_offset(prev: u8) -> u8 {
    match prev {
        0xE0 => 2,
        0xED | 0xF0 => 3,
        0xF4 => 4,
        _ => 0,
    }
}

/// True if `byte` lies outside the bounds selected by `range`.
///
/// `range` is masked to 4 bits, matching a 16-entry byte shuffle.
#[inline(always)]
pub const fn out_of_range(byte: u8, range: u8) -> bool {
    let idx = (range & 0x0F) as usize;
    byte < RANGE_MIN[idx] || byte > RANGE_MAX[idx]
}

/// Bound-table row selected for a byte.
///
/// Indices 0-8 are legality rules; 9-15 are produced only by malformed input
/// (a lead byte where a continuation is required, overlapping sequences) and
/// select bounds no byte satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeIndex {
    /// 0: ASCII byte in first position (00..7F).
    Ascii,
    /// 1: final continuation byte of any multi-byte sequence (80..BF).
    LastContinuation,
    /// 2: second byte of a 3-byte or third byte of a 4-byte sequence (80..BF).
    MiddleContinuation,
    /// 3: second byte of a 4-byte sequence led by F1..F3 (80..BF).
    FourByteSecond,
    /// 4: second byte after E0 (A0..BF), rejects overlong 3-byte forms.
    AfterE0,
    /// 5: second byte after ED (80..9F), rejects surrogates.
    AfterED,
    /// 6: second byte after F0 (90..BF), rejects overlong 4-byte forms.
    AfterF0,
    /// 7: second byte after F4 (80..8F), rejects code points above U+10FFFF.
    AfterF4,
    /// 8: non-ASCII lead byte (C2..F4).
    Lead,
    /// 9-15: always a violation.
    Invalid(u8),
}

impl RangeIndex {
    /// Interpret the low nibble of a computed range byte.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        match raw & 0x0F {
            0 => Self::Ascii,
            1 => Self::LastContinuation,
            2 => Self::MiddleContinuation,
            3 => Self::FourByteSecond,
            4 => Self::AfterE0,
            5 => Self::AfterED,
            6 => Self::AfterF0,
            7 => Self::AfterF4,
            8 => Self::Lead,
            n => Self::Invalid(n),
        }
    }

    /// Table row for this index.
    #[inline]
    pub const fn to_raw(self) -> u8 {
        match self {
            Self::Ascii => 0,
            Self::LastContinuation => 1,
            Self::MiddleContinuation => 2,
            Self::FourByteSecond => 3,
            Self::AfterE0 => 4,
            Self::AfterED => 5,
            Self::AfterF0 => 6,
            Self::AfterF4 => 7,
            Self::Lead => 8,
            Self::Invalid(n) => n,
        }
    }

    /// Inclusive `(min, max)` bounds for this index.
    #[inline]
    pub const fn bounds(self) -> (u8, u8) {
        let idx = self.to_raw() as usize & 0x0F;
        (RANGE_MIN[idx], RANGE_MAX[idx])
    }

    /// True for the sentinel rows 9-15.
    #[inline]
    pub const fn is_sentinel(self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_table_matches_lead_lengths() {
        for byte in 0u8..=0xFF {
            let expected = match byte {
                0x00..=0xBF => 0,
                0xC0..=0xDF => 1,
                0xE0..=0xEF => 2,
                0xF0..=0xFF => 3,
            };
            assert_eq!(follow_len(byte), expected, "byte 0x{:02X}", byte);
        }
    }

    #[test]
    fn sentinel_rows_reject_every_byte() {
        for raw in 9u8..16 {
            let idx = RangeIndex::from_raw(raw);
            assert!(idx.is_sentinel());
            for byte in 0u8..=0xFF {
                assert!(out_of_range(byte, raw), "row {} accepted 0x{:02X}", raw, byte);
            }
        }
    }

    #[test]
    fn valid_rows_accept_their_ranges() {
        let cases: [(RangeIndex, u8, u8); 9] = [
            (RangeIndex::Ascii, 0x00, 0x7F),
            (RangeIndex::LastContinuation, 0x80, 0xBF),
            (RangeIndex::MiddleContinuation, 0x80, 0xBF),
            (RangeIndex::FourByteSecond, 0x80, 0xBF),
            (RangeIndex::AfterE0, 0xA0, 0xBF),
            (RangeIndex::AfterED, 0x80, 0x9F),
            (RangeIndex::AfterF0, 0x90, 0xBF),
            (RangeIndex::AfterF4, 0x80, 0x8F),
            (RangeIndex::Lead, 0xC2, 0xF4),
        ];
        for (idx, lo, hi) in cases {
            assert!(!idx.is_sentinel());
            assert_eq!(idx.bounds(), (lo, hi));
            for byte in 0u8..=0xFF {
                let inside = (lo..=hi).contains(&byte);
                assert_eq!(!out_of_range(byte, idx.to_raw()), inside);
            }
        }
    }

    #[test]
    fn raw_roundtrip_covers_all_rows() {
        for raw in 0u8..16 {
            assert_eq!(RangeIndex::from_raw(raw).to_raw(), raw);
        }
    }

    #[test]
    fn special_offsets_agree_with_table() {
        for (lead, offset) in SPECIAL_LEADS {
            assert_eq!(special_offset(lead), offset);
            let row = follow_len(lead) + offset;
            let idx = RangeIndex::from_raw(row);
            assert!(matches!(
                idx,
                RangeIndex::AfterE0 | RangeIndex::AfterED | RangeIndex::AfterF0 | RangeIndex::AfterF4
            ));
        }
        assert_eq!(special_offset(0xE1), 0);
        assert_eq!(special_offset(0xF3), 0);
    }
}
