//! Portable range-table UTF-8 validation over fixed-width lanes.
//!
//! [`Lanes<W>`] is a `W`-byte vector written as plain array code. Every
//! operation is lane-wise and branch-free, so the compiler is free to lower a
//! block step to whatever vector unit the target has. The hardware kernels in
//! [`crate::simd`] implement exactly the same block step with intrinsics.
//!
//! ## Block step
//!
//! For each lane `i` of a block, with `follow` the continuation length of
//! each byte (see [`FOLLOW_TABLE`]):
//!
//! ```text
//! range[i]  = follow[i-1] | sat_sub(follow[i-2], 1) | sat_sub(follow[i-3], 2)
//! range[i] += 8                 if follow[i] > 0
//! range[i] += 2 / 3 / 3 / 4     if byte[i-1] is E0 / ED / F0 / F4
//! violation[i] = byte[i] < RANGE_MIN[range[i]] || byte[i] > RANGE_MAX[range[i]]
//! ```
//!
//! Lanes `i-1 .. i-3` that fall before the block are read from the [`Carry`].
//!
//! ## Driver
//!
//! [`validate`] scans every full block, ORing violations into one
//! accumulator that is inspected once at the end. If it is clean, the cursor
//! rewinds to the last non-continuation byte among the final three bytes of
//! the last block and the rest is handed to
//! [`validate_utf8_scalar`](super::scalar::validate_utf8_scalar).

use super::scalar::{is_continuation_byte, validate_utf8_scalar};
use super::tables::{
    RangeIndex, FOLLOW_TABLE, LEAD_OFFSET, RANGE_MAX, RANGE_MIN, SPECIAL_LEADS,
};

/// Default lane width of the portable kernel.
pub const DEFAULT_WIDTH: usize = 16;

/// A fixed-width vector of bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Lanes<const W: usize>(pub [u8; W]);

impl<const W: usize> Default for Lanes<W> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const W: usize> Lanes<W> {
    /// All lanes zero.
    pub const ZERO: Self = Self([0; W]);

    /// Every lane set to `value`.
    #[inline(always)]
    pub fn splat(value: u8) -> Self {
        Self([value; W])
    }

    /// Load the first `W` bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `W`.
    #[inline(always)]
    pub fn load(bytes: &[u8]) -> Self {
        let mut lanes = [0u8; W];
        lanes.copy_from_slice(&bytes[..W]);
        Self(lanes)
    }

    #[inline(always)]
    fn map(self, f: impl Fn(u8) -> u8) -> Self {
        let mut out = self.0;
        for lane in out.iter_mut() {
            *lane = f(*lane);
        }
        Self(out)
    }

    #[inline(always)]
    fn zip(self, other: Self, f: impl Fn(u8, u8) -> u8) -> Self {
        let mut out = self.0;
        for (lane, &b) in out.iter_mut().zip(other.0.iter()) {
            *lane = f(*lane, b);
        }
        Self(out)
    }

    /// 16-entry table lookup on the low nibble of each lane (byte shuffle).
    #[inline(always)]
    pub fn lookup(self, table: &[u8; 16]) -> Self {
        self.map(|b| table[(b & 0x0F) as usize])
    }

    /// Continuation length of each lane's byte.
    #[inline(always)]
    pub fn follow_lengths(self) -> Self {
        self.map(|b| b >> 4).lookup(&FOLLOW_TABLE)
    }

    #[inline(always)]
    pub fn saturating_sub(self, n: u8) -> Self {
        self.map(|b| b.saturating_sub(n))
    }

    #[inline(always)]
    pub fn or(self, other: Self) -> Self {
        self.zip(other, |a, b| a | b)
    }

    #[inline(always)]
    pub fn and(self, other: Self) -> Self {
        self.zip(other, |a, b| a & b)
    }

    #[inline(always)]
    pub fn wrapping_add(self, other: Self) -> Self {
        self.zip(other, u8::wrapping_add)
    }

    /// `0xFF` where the lane equals `value`, else `0x00`.
    #[inline(always)]
    pub fn eq_splat(self, value: u8) -> Self {
        self.map(|b| if b == value { 0xFF } else { 0x00 })
    }

    /// `0xFF` where the lane is nonzero.
    #[inline(always)]
    pub fn nonzero(self) -> Self {
        self.map(|b| if b != 0 { 0xFF } else { 0x00 })
    }

    /// `0xFF` where `self < other` (unsigned).
    #[inline(always)]
    pub fn lt(self, other: Self) -> Self {
        self.zip(other, |a, b| if a < b { 0xFF } else { 0x00 })
    }

    /// `0xFF` where `self > other` (unsigned).
    #[inline(always)]
    pub fn gt(self, other: Self) -> Self {
        self.zip(other, |a, b| if a > b { 0xFF } else { 0x00 })
    }

    /// Shift lanes up by `n`, filling the low `n` lanes with the top `n`
    /// lanes of `prev` (`palignr` / `vext` semantics).
    #[inline(always)]
    pub fn shift_in(self, prev: Self, n: usize) -> Self {
        debug_assert!(n <= W);
        let mut out = [0u8; W];
        out[..n].copy_from_slice(&prev.0[W - n..]);
        out[n..].copy_from_slice(&self.0[..W - n]);
        Self(out)
    }

    /// True if any lane is nonzero.
    #[inline(always)]
    pub fn any(self) -> bool {
        self.0.iter().fold(0u8, |acc, &b| acc | b) != 0
    }
}

/// Cross-block state: the raw bytes and continuation lengths of the
/// previously checked block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Carry<const W: usize> {
    pub input: Lanes<W>,
    pub follow: Lanes<W>,
}

impl<const W: usize> Default for Carry<W> {
    /// All-zero carry, as if the buffer were preceded by ASCII.
    fn default() -> Self {
        Self {
            input: Lanes::ZERO,
            follow: Lanes::ZERO,
        }
    }
}

impl<const W: usize> Carry<W> {
    /// Evaluated at monomorphization; shifts reach three lanes back.
    pub(crate) const WIDTH_OK: () = assert!(W >= 4, "block width must be at least 4 lanes");

    /// Carry as it would be after checking `block`.
    ///
    /// Takes the last `W` bytes of `block`. A shorter `block` is treated as
    /// preceded by ASCII, as at the start of the input. Used to resume a scan
    /// at a block boundary without scanning what precedes it.
    pub fn from_block(block: &[u8]) -> Self {
        let n = block.len().min(W);
        let mut lanes = [0u8; W];
        lanes[W - n..].copy_from_slice(&block[block.len() - n..]);
        let input = Lanes(lanes);
        Self {
            input,
            follow: input.follow_lengths(),
        }
    }
}

/// Compute each lane's range index and continuation length.
#[inline(always)]
fn range_lanes<const W: usize>(block: Lanes<W>, carry: &Carry<W>) -> (Lanes<W>, Lanes<W>) {
    let follow = block.follow_lengths();

    // 2nd byte
    let mut range = follow.shift_in(carry.follow, 1);

    // 3rd byte
    let third = follow
        .saturating_sub(1)
        .shift_in(carry.follow.saturating_sub(1), 2);
    range = range.or(third);

    // 4th byte
    let fourth = follow
        .saturating_sub(2)
        .shift_in(carry.follow.saturating_sub(2), 3);
    range = range.or(fourth);

    // A lead byte where a continuation is expected lands in 9..=11
    range = range.wrapping_add(follow.nonzero().and(Lanes::splat(LEAD_OFFSET)));

    let prev = block.shift_in(carry.input, 1);
    for (lead, offset) in SPECIAL_LEADS {
        range = range.wrapping_add(prev.eq_splat(lead).and(Lanes::splat(offset)));
    }

    (range, follow)
}

/// Check one block and advance the carry.
///
/// Returns the per-lane violation mask (`0xFF` = out of bounds).
#[inline(always)]
pub fn check_block<const W: usize>(block: Lanes<W>, carry: &mut Carry<W>) -> Lanes<W> {
    let (range, follow) = range_lanes(block, carry);

    let min = range.lookup(&RANGE_MIN);
    let max = range.lookup(&RANGE_MAX);
    let violation = block.lt(min).or(block.gt(max));

    carry.input = block;
    carry.follow = follow;

    violation
}

/// Range index of every lane of `block`, given the carry before it.
///
/// # Panics
///
/// Panics if `block` is shorter than `W`.
pub fn range_indices<const W: usize>(block: &[u8], carry: &Carry<W>) -> [RangeIndex; W] {
    let (range, _) = range_lanes(Lanes::load(block), carry);
    range.0.map(RangeIndex::from_raw)
}

/// Scan `blocks` (a whole number of `W`-byte blocks) and report whether no
/// lane violated its bounds.
///
/// `prev` supplies the bytes immediately before `blocks`; only its last `W`
/// bytes are read, and a shorter `prev` counts as preceded by ASCII. `None`
/// starts from the all-zero carry.
///
/// # Panics
///
/// Panics in debug builds if `blocks.len()` is not a multiple of `W`.
pub fn scan_blocks<const W: usize>(blocks: &[u8], prev: Option<&[u8]>) -> bool {
    let () = Carry::<W>::WIDTH_OK;
    debug_assert_eq!(blocks.len() % W, 0);

    let mut carry = prev.map(Carry::<W>::from_block).unwrap_or_default();
    let mut error = Lanes::<W>::ZERO;

    for chunk in blocks.chunks_exact(W) {
        error = error.or(check_block(Lanes::load(chunk), &mut carry));
    }

    // Delay the error check until every block has been seen
    !error.any()
}

/// Validate `input` with the portable `W`-lane kernel.
///
/// # Examples
///
/// ```
/// use utf8range::text::range::validate;
///
/// assert!(validate::<16>("grüße, 世界 🎉 and some ascii padding".as_bytes()));
/// assert!(!validate::<16>(b"sixteen ascii by\x80"));
/// ```
pub fn validate<const W: usize>(input: &[u8]) -> bool {
    drive(input, W, |blocks| scan_blocks::<W>(blocks, None))
}

/// Shared streaming driver.
///
/// Runs `scan` over the largest whole-block prefix of `input`, then resolves
/// the tail. Inputs shorter than one block go straight to the scalar
/// validator.
#[inline]
pub(crate) fn drive(input: &[u8], width: usize, scan: impl FnOnce(&[u8]) -> bool) -> bool {
    if input.len() < width {
        return validate_utf8_scalar(input);
    }

    let full = input.len() - input.len() % width;
    if !scan(&input[..full]) {
        return false;
    }

    finish_tail(input, full)
}

/// Validate everything from the start of the last possibly-open sequence in
/// `input[..full]` to the end of `input`.
///
/// `full` is the length of the clean whole-block prefix and must be at
/// least 3.
pub(crate) fn finish_tail(input: &[u8], full: usize) -> bool {
    debug_assert!(full >= 3 && full <= input.len());
    let back = lookahead(&input[full - 3..full]);
    validate_utf8_scalar(&input[full - back..])
}

/// Distance from the end of `last3` back to the last byte that is not a
/// continuation byte, or 0 if all three are continuation bytes.
#[inline]
pub fn lookahead(last3: &[u8]) -> usize {
    match last3 {
        [_, _, c] if !is_continuation_byte(*c) => 1,
        [_, b, _] if !is_continuation_byte(*b) => 2,
        [a, _, _] if !is_continuation_byte(*a) => 3,
        _ => 0,
    }
}

/// Per-block debug snapshot produced by [`BlockTracer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockTrace<const W: usize> {
    /// Offset of the block in the input.
    pub offset: usize,
    pub bytes: Lanes<W>,
    pub follow: Lanes<W>,
    pub range: Lanes<W>,
    pub violation: Lanes<W>,
}

/// Iterator over the full blocks of an input, yielding each block's
/// intermediate vectors.
pub struct BlockTracer<'a, const W: usize> {
    chunks: core::slice::ChunksExact<'a, u8>,
    carry: Carry<W>,
    offset: usize,
}

impl<'a, const W: usize> BlockTracer<'a, W> {
    pub fn new(input: &'a [u8]) -> Self {
        let () = Carry::<W>::WIDTH_OK;
        Self {
            chunks: input.chunks_exact(W),
            carry: Carry::default(),
            offset: 0,
        }
    }

    /// Bytes after the last full block.
    pub fn remainder(&self) -> &'a [u8] {
        self.chunks.remainder()
    }
}

impl<'a, const W: usize> Iterator for BlockTracer<'a, W> {
    type Item = BlockTrace<W>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = Lanes::load(self.chunks.next()?);
        let (range, follow) = range_lanes(bytes, &self.carry);
        let violation = check_block(bytes, &mut self.carry);
        let trace = BlockTrace {
            offset: self.offset,
            bytes,
            follow,
            range,
            violation,
        };
        self.offset += W;
        Some(trace)
    }
}
