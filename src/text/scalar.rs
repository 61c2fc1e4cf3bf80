//! Byte-at-a-time UTF-8 validation.
//!
//! This is the fallback the block kernels hand off to: it validates buffers
//! shorter than one block, the unaligned tail after the last full block, and
//! whole buffers on platforms without a usable vector kernel. It is also the
//! reference every kernel is tested against.
//!
//! ## UTF-8 Encoding Rules
//!
//! | Bytes | First byte    | Continuation bytes | Code point range     |
//! |-------|---------------|-------------------|----------------------|
//! | 1     | `0xxxxxxx`    | -                 | U+0000 - U+007F      |
//! | 2     | `110xxxxx`    | `10xxxxxx`        | U+0080 - U+07FF      |
//! | 3     | `1110xxxx`    | `10xxxxxx` × 2    | U+0800 - U+FFFF      |
//! | 4     | `11110xxx`    | `10xxxxxx` × 3    | U+10000 - U+10FFFF   |
//!
//! Rejected: bare continuation bytes, overlong encodings, surrogates
//! (U+D800-U+DFFF), code points above U+10FFFF, and sequences truncated by
//! the end of input.

/// Validate UTF-8 one byte at a time.
///
/// Returns `true` if the whole of `input` is well-formed UTF-8.
///
/// # Examples
///
/// ```
/// use utf8range::text::scalar::validate_utf8_scalar;
///
/// assert!(validate_utf8_scalar(b"Hello, world!"));
/// assert!(validate_utf8_scalar("日本語".as_bytes()));
/// assert!(!validate_utf8_scalar(&[0x80]));
/// assert!(!validate_utf8_scalar(&[0xC2]));
/// ```
pub fn validate_utf8_scalar(input: &[u8]) -> bool {
    let len = input.len();
    let mut pos = 0;

    while pos < len {
        let byte = input[pos];

        if byte < 0x80 {
            pos += 1;
            continue;
        }

        let seq_len = sequence_length(byte);
        if seq_len == 0 || pos + seq_len > len {
            return false;
        }

        // Second byte carries every lead-specific restriction
        let b1 = input[pos + 1];
        let (lo, hi) = second_byte_range(byte);
        if b1 < lo || b1 > hi {
            return false;
        }

        if input[pos + 2..pos + seq_len]
            .iter()
            .any(|&b| !is_continuation_byte(b))
        {
            return false;
        }

        pos += seq_len;
    }

    true
}

/// Inclusive range allowed for the byte following `lead`.
#[inline]
fn second_byte_range(lead: u8) -> (u8, u8) {
    match lead {
        0xE0 => (0xA0, 0xBF),
        0xED => (0x80, 0x9F),
        0xF0 => (0x90, 0xBF),
        0xF4 => (0x80, 0x8F),
        _ => (0x80, 0xBF),
    }
}

/// Check if a byte is a UTF-8 continuation byte (0x80-0xBF).
#[inline(always)]
pub fn is_continuation_byte(byte: u8) -> bool {
    (byte & 0xC0) == 0x80
}

/// Get the sequence length started by a lead byte.
///
/// Returns 0 for bytes that can never start a well-formed sequence:
/// continuation bytes, the overlong leads C0/C1, and F5-FF.
#[inline]
pub fn sequence_length(lead_byte: u8) -> usize {
    match lead_byte {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}
