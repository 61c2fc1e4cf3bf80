//! x86_64 block kernels for range-table UTF-8 validation.
//!
//! - SSSE3: 16-byte blocks (`pshufb` lookups, `palignr` carry shifts)
//! - AVX2: 32-byte blocks; `vpalignr` works within 128-bit lanes, so carry
//!   shifts go through `vperm2i128` first
//!
//! Byte compares on x86 are signed. Both the input and the bound tables are
//! XORed with [`SIGN_FLIP`] so signed order matches unsigned order.

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::text::range::drive;
use crate::text::tables::{FOLLOW_TABLE, LEAD_OFFSET, RANGE_MAX, RANGE_MIN, SIGN_FLIP, SPECIAL_LEADS};

/// Block width of the SSSE3 kernel.
pub const SSSE3_WIDTH: usize = 16;

/// Block width of the AVX2 kernel.
pub const AVX2_WIDTH: usize = 32;

// =============================================================================
// SSSE3 (16 bytes)
// =============================================================================

/// Constant vectors for the 128-bit kernel. Create once per scan.
struct Tables128 {
    follow: __m128i,
    /// Range minimums, sign-flipped.
    min: __m128i,
    /// Range maximums, sign-flipped.
    max: __m128i,
    nibble_mask: __m128i,
    sign_flip: __m128i,
}

impl Tables128 {
    #[target_feature(enable = "ssse3")]
    #[inline]
    unsafe fn new() -> Self {
        unsafe {
            let sign_flip = _mm_set1_epi8(SIGN_FLIP as i8);
            Self {
                follow: _mm_loadu_si128(FOLLOW_TABLE.as_ptr() as *const __m128i),
                min: _mm_xor_si128(
                    _mm_loadu_si128(RANGE_MIN.as_ptr() as *const __m128i),
                    sign_flip,
                ),
                max: _mm_xor_si128(
                    _mm_loadu_si128(RANGE_MAX.as_ptr() as *const __m128i),
                    sign_flip,
                ),
                nibble_mask: _mm_set1_epi8(0x0F),
                sign_flip,
            }
        }
    }
}

/// Continuation length of each byte (there is no `_mm_srli_epi8`, so shift
/// 16-bit lanes and mask).
#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn follow_128(input: __m128i, t: &Tables128) -> __m128i {
    let high_nibbles = _mm_and_si128(_mm_srli_epi16(input, 4), t.nibble_mask);
    _mm_shuffle_epi8(t.follow, high_nibbles)
}

/// Range index of every lane. Returns `(range, follow)`.
#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn range_128(
    input: __m128i,
    prev_input: __m128i,
    prev_follow: __m128i,
    t: &Tables128,
) -> (__m128i, __m128i) {
    unsafe {
        let follow = follow_128(input, t);
        let one = _mm_set1_epi8(1);
        let two = _mm_set1_epi8(2);

        // 2nd byte: (follow, prev_follow) << 1 byte
        let mut range = _mm_alignr_epi8(follow, prev_follow, 15);

        // 3rd byte
        let tmp = _mm_alignr_epi8(
            _mm_subs_epu8(follow, one),
            _mm_subs_epu8(prev_follow, one),
            14,
        );
        range = _mm_or_si128(range, tmp);

        // 4th byte
        let tmp = _mm_alignr_epi8(
            _mm_subs_epu8(follow, two),
            _mm_subs_epu8(prev_follow, two),
            13,
        );
        range = _mm_or_si128(range, tmp);

        // Overlap lands in 9..=11
        let lead_mask = _mm_cmpgt_epi8(follow, _mm_setzero_si128());
        range = _mm_add_epi8(
            range,
            _mm_and_si128(lead_mask, _mm_set1_epi8(LEAD_OFFSET as i8)),
        );

        let prev1 = _mm_alignr_epi8(input, prev_input, 15);
        for (lead, offset) in SPECIAL_LEADS {
            let pos = _mm_cmpeq_epi8(prev1, _mm_set1_epi8(lead as i8));
            range = _mm_add_epi8(range, _mm_and_si128(pos, _mm_set1_epi8(offset as i8)));
        }

        (range, follow)
    }
}

/// Check one 16-byte block. Returns `(violation, follow)`.
#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn check_128(
    input: __m128i,
    prev_input: __m128i,
    prev_follow: __m128i,
    t: &Tables128,
) -> (__m128i, __m128i) {
    unsafe {
        let (range, follow) = range_128(input, prev_input, prev_follow, t);

        let minv = _mm_shuffle_epi8(t.min, range);
        let maxv = _mm_shuffle_epi8(t.max, range);

        let flipped = _mm_xor_si128(input, t.sign_flip);
        let violation = _mm_or_si128(
            _mm_cmplt_epi8(flipped, minv),
            _mm_cmpgt_epi8(flipped, maxv),
        );

        (violation, follow)
    }
}

/// Scan whole 16-byte blocks with SSSE3.
///
/// `prev` holds at least 16 bytes immediately preceding `blocks`, or `None`
/// for the start of the input. Returns `true` if no lane was out of bounds.
///
/// # Safety
///
/// - CPU must support SSSE3 (caller should check)
/// - `blocks.len()` must be a multiple of 16
/// - `prev`, if given, must hold at least 16 bytes
#[target_feature(enable = "ssse3")]
pub unsafe fn scan_blocks_ssse3(blocks: &[u8], prev: Option<&[u8]>) -> bool {
    unsafe {
        debug_assert_eq!(blocks.len() % SSSE3_WIDTH, 0);
        let t = Tables128::new();

        let (mut prev_input, mut prev_follow) = match prev {
            Some(p) => {
                let v = _mm_loadu_si128(p[p.len() - SSSE3_WIDTH..].as_ptr() as *const __m128i);
                (v, follow_128(v, &t))
            }
            None => (_mm_setzero_si128(), _mm_setzero_si128()),
        };
        let mut error = _mm_setzero_si128();

        for chunk in blocks.chunks_exact(SSSE3_WIDTH) {
            let input = _mm_loadu_si128(chunk.as_ptr() as *const __m128i);
            let (violation, follow) = check_128(input, prev_input, prev_follow, &t);
            error = _mm_or_si128(error, violation);
            prev_input = input;
            prev_follow = follow;
        }

        // error_reduced = 0xFFFF if error == 0
        _mm_movemask_epi8(_mm_cmpeq_epi8(error, _mm_setzero_si128())) == 0xFFFF
    }
}

/// Validate UTF-8 with the SSSE3 kernel.
///
/// # Safety
///
/// CPU must support SSSE3 (caller should check).
#[target_feature(enable = "ssse3")]
pub unsafe fn validate_ssse3(input: &[u8]) -> bool {
    drive(input, SSSE3_WIDTH, |blocks| unsafe {
        scan_blocks_ssse3(blocks, None)
    })
}

/// Raw range indices the SSSE3 kernel computes for `block` after `prev`.
///
/// # Safety
///
/// CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
pub unsafe fn range_indices_ssse3(block: &[u8; 16], prev: &[u8; 16]) -> [u8; 16] {
    unsafe {
        let t = Tables128::new();
        let input = _mm_loadu_si128(block.as_ptr() as *const __m128i);
        let prev_input = _mm_loadu_si128(prev.as_ptr() as *const __m128i);
        let (range, _) = range_128(input, prev_input, follow_128(prev_input, &t), &t);
        bytemuck::cast(range)
    }
}

// =============================================================================
// AVX2 (32 bytes)
// =============================================================================

/// Constant vectors for the 256-bit kernel, tables repeated in both lanes.
struct Tables256 {
    follow: __m256i,
    min: __m256i,
    max: __m256i,
    nibble_mask: __m256i,
    sign_flip: __m256i,
}

impl Tables256 {
    #[target_feature(enable = "avx2")]
    #[inline]
    unsafe fn new() -> Self {
        unsafe {
            let sign_flip = _mm256_set1_epi8(SIGN_FLIP as i8);
            Self {
                follow: broadcast_table(&FOLLOW_TABLE),
                min: _mm256_xor_si256(broadcast_table(&RANGE_MIN), sign_flip),
                max: _mm256_xor_si256(broadcast_table(&RANGE_MAX), sign_flip),
                nibble_mask: _mm256_set1_epi8(0x0F),
                sign_flip,
            }
        }
    }
}

/// Load a 16-entry table into both 128-bit lanes.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn broadcast_table(table: &[u8; 16]) -> __m256i {
    unsafe { _mm256_broadcastsi128_si256(_mm_loadu_si128(table.as_ptr() as *const __m128i)) }
}

/// Shift a 256-bit register up by 1 byte, bringing prev[31] to position 0.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn shift_in_1(input: __m256i, prev: __m256i) -> __m256i {
    // [prev_high, input_low], then alignr within each lane
    let prev_high_input_low = _mm256_permute2x128_si256(prev, input, 0x21);
    _mm256_alignr_epi8(input, prev_high_input_low, 15)
}

/// Shift a 256-bit register up by 2 bytes.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn shift_in_2(input: __m256i, prev: __m256i) -> __m256i {
    let prev_high_input_low = _mm256_permute2x128_si256(prev, input, 0x21);
    _mm256_alignr_epi8(input, prev_high_input_low, 14)
}

/// Shift a 256-bit register up by 3 bytes.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn shift_in_3(input: __m256i, prev: __m256i) -> __m256i {
    let prev_high_input_low = _mm256_permute2x128_si256(prev, input, 0x21);
    _mm256_alignr_epi8(input, prev_high_input_low, 13)
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn follow_256(input: __m256i, t: &Tables256) -> __m256i {
    let high_nibbles = _mm256_and_si256(_mm256_srli_epi16(input, 4), t.nibble_mask);
    _mm256_shuffle_epi8(t.follow, high_nibbles)
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn range_256(
    input: __m256i,
    prev_input: __m256i,
    prev_follow: __m256i,
    t: &Tables256,
) -> (__m256i, __m256i) {
    unsafe {
        let follow = follow_256(input, t);
        let one = _mm256_set1_epi8(1);
        let two = _mm256_set1_epi8(2);

        let mut range = shift_in_1(follow, prev_follow);
        range = _mm256_or_si256(
            range,
            shift_in_2(
                _mm256_subs_epu8(follow, one),
                _mm256_subs_epu8(prev_follow, one),
            ),
        );
        range = _mm256_or_si256(
            range,
            shift_in_3(
                _mm256_subs_epu8(follow, two),
                _mm256_subs_epu8(prev_follow, two),
            ),
        );

        let lead_mask = _mm256_cmpgt_epi8(follow, _mm256_setzero_si256());
        range = _mm256_add_epi8(
            range,
            _mm256_and_si256(lead_mask, _mm256_set1_epi8(LEAD_OFFSET as i8)),
        );

        let prev1 = shift_in_1(input, prev_input);
        for (lead, offset) in SPECIAL_LEADS {
            let pos = _mm256_cmpeq_epi8(prev1, _mm256_set1_epi8(lead as i8));
            range = _mm256_add_epi8(
                range,
                _mm256_and_si256(pos, _mm256_set1_epi8(offset as i8)),
            );
        }

        (range, follow)
    }
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn check_256(
    input: __m256i,
    prev_input: __m256i,
    prev_follow: __m256i,
    t: &Tables256,
) -> (__m256i, __m256i) {
    unsafe {
        let (range, follow) = range_256(input, prev_input, prev_follow, t);

        let minv = _mm256_shuffle_epi8(t.min, range);
        let maxv = _mm256_shuffle_epi8(t.max, range);

        let flipped = _mm256_xor_si256(input, t.sign_flip);
        let violation = _mm256_or_si256(
            _mm256_cmpgt_epi8(minv, flipped),
            _mm256_cmpgt_epi8(flipped, maxv),
        );

        (violation, follow)
    }
}

/// Scan whole 32-byte blocks with AVX2.
///
/// # Safety
///
/// - CPU must support AVX2 (caller should check)
/// - `blocks.len()` must be a multiple of 32
/// - `prev`, if given, must hold at least 32 bytes
#[target_feature(enable = "avx2")]
pub unsafe fn scan_blocks_avx2(blocks: &[u8], prev: Option<&[u8]>) -> bool {
    unsafe {
        debug_assert_eq!(blocks.len() % AVX2_WIDTH, 0);
        let t = Tables256::new();

        let (mut prev_input, mut prev_follow) = match prev {
            Some(p) => {
                let v = _mm256_loadu_si256(p[p.len() - AVX2_WIDTH..].as_ptr() as *const __m256i);
                (v, follow_256(v, &t))
            }
            None => (_mm256_setzero_si256(), _mm256_setzero_si256()),
        };
        let mut error = _mm256_setzero_si256();

        for chunk in blocks.chunks_exact(AVX2_WIDTH) {
            let input = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
            let (violation, follow) = check_256(input, prev_input, prev_follow, &t);
            error = _mm256_or_si256(error, violation);
            prev_input = input;
            prev_follow = follow;
        }

        _mm256_testz_si256(error, error) == 1
    }
}

/// Validate UTF-8 with the AVX2 kernel.
///
/// # Safety
///
/// CPU must support AVX2 (caller should check).
#[target_feature(enable = "avx2")]
pub unsafe fn validate_avx2(input: &[u8]) -> bool {
    drive(input, AVX2_WIDTH, |blocks| unsafe {
        scan_blocks_avx2(blocks, None)
    })
}

/// Raw range indices the AVX2 kernel computes for `block` after `prev`.
///
/// # Safety
///
/// CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn range_indices_avx2(block: &[u8; 32], prev: &[u8; 32]) -> [u8; 32] {
    unsafe {
        let t = Tables256::new();
        let input = _mm256_loadu_si256(block.as_ptr() as *const __m256i);
        let prev_input = _mm256_loadu_si256(prev.as_ptr() as *const __m256i);
        let (range, _) = range_256(input, prev_input, follow_256(prev_input, &t), &t);
        bytemuck::cast(range)
    }
}
