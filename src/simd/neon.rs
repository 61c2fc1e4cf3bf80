//! aarch64 NEON block kernel for range-table UTF-8 validation.
//!
//! Processes 16 bytes at a time. NEON has unsigned byte compares and a
//! 16-entry table lookup (`tbl`), so the bound tables are used as stored.

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

use crate::text::range::drive;
use crate::text::tables::{FOLLOW_TABLE, LEAD_OFFSET, RANGE_MAX, RANGE_MIN, SPECIAL_LEADS};

/// Block width of the NEON kernel.
pub const NEON_WIDTH: usize = 16;

struct TablesNeon {
    follow: uint8x16_t,
    min: uint8x16_t,
    max: uint8x16_t,
}

impl TablesNeon {
    #[inline]
    unsafe fn new() -> Self {
        unsafe {
            Self {
                follow: vld1q_u8(FOLLOW_TABLE.as_ptr()),
                min: vld1q_u8(RANGE_MIN.as_ptr()),
                max: vld1q_u8(RANGE_MAX.as_ptr()),
            }
        }
    }
}

#[inline]
unsafe fn follow_neon(input: uint8x16_t, t: &TablesNeon) -> uint8x16_t {
    vqtbl1q_u8(t.follow, vshrq_n_u8::<4>(input))
}

/// Range index of every lane. Returns `(range, follow)`.
#[inline]
unsafe fn range_neon(
    input: uint8x16_t,
    prev_input: uint8x16_t,
    prev_follow: uint8x16_t,
    t: &TablesNeon,
) -> (uint8x16_t, uint8x16_t) {
    unsafe {
        let follow = follow_neon(input, t);
        let one = vdupq_n_u8(1);
        let two = vdupq_n_u8(2);

        // vext(prev, cur, 16 - n) = (cur, prev) << n bytes
        let mut range = vextq_u8::<15>(prev_follow, follow);
        range = vorrq_u8(
            range,
            vextq_u8::<14>(vqsubq_u8(prev_follow, one), vqsubq_u8(follow, one)),
        );
        range = vorrq_u8(
            range,
            vextq_u8::<13>(vqsubq_u8(prev_follow, two), vqsubq_u8(follow, two)),
        );

        let lead_mask = vcgtq_u8(follow, vdupq_n_u8(0));
        range = vaddq_u8(range, vandq_u8(lead_mask, vdupq_n_u8(LEAD_OFFSET)));

        let prev1 = vextq_u8::<15>(prev_input, input);
        for (lead, offset) in SPECIAL_LEADS {
            let pos = vceqq_u8(prev1, vdupq_n_u8(lead));
            range = vaddq_u8(range, vandq_u8(pos, vdupq_n_u8(offset)));
        }

        (range, follow)
    }
}

#[inline]
unsafe fn check_neon(
    input: uint8x16_t,
    prev_input: uint8x16_t,
    prev_follow: uint8x16_t,
    t: &TablesNeon,
) -> (uint8x16_t, uint8x16_t) {
    unsafe {
        let (range, follow) = range_neon(input, prev_input, prev_follow, t);

        let minv = vqtbl1q_u8(t.min, range);
        let maxv = vqtbl1q_u8(t.max, range);
        let violation = vorrq_u8(vcltq_u8(input, minv), vcgtq_u8(input, maxv));

        (violation, follow)
    }
}

/// Scan whole 16-byte blocks with NEON.
///
/// # Safety
///
/// - `blocks.len()` must be a multiple of 16
/// - `prev`, if given, must hold at least 16 bytes
#[inline]
pub unsafe fn scan_blocks_neon(blocks: &[u8], prev: Option<&[u8]>) -> bool {
    unsafe {
        debug_assert_eq!(blocks.len() % NEON_WIDTH, 0);
        let t = TablesNeon::new();

        let (mut prev_input, mut prev_follow) = match prev {
            Some(p) => {
                let v = vld1q_u8(p[p.len() - NEON_WIDTH..].as_ptr());
                (v, follow_neon(v, &t))
            }
            None => (vdupq_n_u8(0), vdupq_n_u8(0)),
        };
        let mut error = vdupq_n_u8(0);

        for chunk in blocks.chunks_exact(NEON_WIDTH) {
            let input = vld1q_u8(chunk.as_ptr());
            let (violation, follow) = check_neon(input, prev_input, prev_follow, &t);
            error = vorrq_u8(error, violation);
            prev_input = input;
            prev_follow = follow;
        }

        vmaxvq_u8(error) == 0
    }
}

/// Validate UTF-8 with the NEON kernel.
///
/// # Safety
///
/// Requires NEON, which every aarch64 target this crate builds for has.
pub unsafe fn validate_neon(input: &[u8]) -> bool {
    drive(input, NEON_WIDTH, |blocks| unsafe {
        scan_blocks_neon(blocks, None)
    })
}

/// Raw range indices the NEON kernel computes for `block` after `prev`.
///
/// # Safety
///
/// Requires NEON.
pub unsafe fn range_indices_neon(block: &[u8; 16], prev: &[u8; 16]) -> [u8; 16] {
    unsafe {
        let t = TablesNeon::new();
        let input = vld1q_u8(block.as_ptr());
        let prev_input = vld1q_u8(prev.as_ptr());
        let (range, _) = range_neon(input, prev_input, follow_neon(prev_input, &t), &t);
        let mut out = [0u8; 16];
        vst1q_u8(out.as_mut_ptr(), range);
        out
    }
}

#[cfg(all(test, target_arch = "aarch64"))]
mod tests {
    use super::*;
    use crate::text::range::{range_indices, Carry};
    use crate::text::scalar::validate_utf8_scalar;

    #[test]
    fn ranges_match_portable() {
        let text = "Ünïcödé ∑ 𝄞 ascii ".repeat(4);
        let bytes = text.as_bytes();
        for start in 16..bytes.len() - 16 {
            let prev: [u8; 16] = bytes[start - 16..start].try_into().unwrap();
            let block: [u8; 16] = bytes[start..start + 16].try_into().unwrap();
            let neon = unsafe { range_indices_neon(&block, &prev) };
            let portable = range_indices::<16>(&block, &Carry::from_block(&prev)).map(|r| r.to_raw());
            assert_eq!(neon, portable, "offset {}", start);
        }
    }

    #[test]
    fn agrees_with_scalar() {
        let mut input = "κόσμε 世界 🎉 ascii text and more".repeat(3).into_bytes();
        assert!(unsafe { validate_neon(&input) });

        for i in 0..input.len() {
            let saved = input[i];
            for b in [0x80u8, 0xC0, 0xED, 0xF5, b'a'] {
                input[i] = b;
                assert_eq!(
                    unsafe { validate_neon(&input) },
                    validate_utf8_scalar(&input),
                    "byte {:02X} at {}",
                    b,
                    i
                );
            }
            input[i] = saved;
        }
    }
}
