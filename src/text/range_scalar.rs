//! Range-table validation one byte at a time.
//!
//! Same tables and index arithmetic as the block kernels, with a block width
//! of one. Since a one-byte block cannot hold the three bytes of history the
//! index needs, [`StepCarry`] keeps them explicitly.

use super::tables::{follow_len, out_of_range, special_offset, LEAD_OFFSET};

/// History needed to compute the next byte's range index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepCarry {
    /// Previous byte value.
    prev: u8,
    /// Continuation lengths of the previous three bytes, most recent first.
    follow: [u8; 3],
}

impl StepCarry {
    /// Check `byte` and advance. Returns `true` if the byte is out of bounds.
    #[inline(always)]
    pub fn step(&mut self, byte: u8) -> bool {
        let follow = follow_len(byte);

        let mut range = self.follow[0]
            | self.follow[1].saturating_sub(1)
            | self.follow[2].saturating_sub(2);
        range += LEAD_OFFSET * u8::from(follow > 0);
        range += special_offset(self.prev);

        self.follow = [follow, self.follow[0], self.follow[1]];
        self.prev = byte;

        out_of_range(byte, range)
    }
}

/// Validate `input` with the byte-at-a-time range kernel.
///
/// Three padding NUL bytes are stepped after the input, so a sequence cut
/// short by the end of the buffer shows up as an ordinary violation.
///
/// # Examples
///
/// ```
/// use utf8range::text::range_scalar::validate_stepwise;
///
/// assert!(validate_stepwise("naïve café".as_bytes()));
/// assert!(!validate_stepwise(&[0xED, 0xA0, 0x80]));
/// assert!(!validate_stepwise(&[0xF0, 0x90, 0x80]));
/// ```
pub fn validate_stepwise(input: &[u8]) -> bool {
    let mut carry = StepCarry::default();
    let mut error = false;

    for &byte in input {
        error |= carry.step(byte);
    }
    for _ in 0..3 {
        error |= carry.step(0);
    }

    !error
}
