//! UTF-8 text generators for benchmarking and testing.
//!
//! Every pattern produces well-formed UTF-8 of exactly the requested size;
//! [`corrupt`] then plants bytes that can never appear in UTF-8.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Pattern types for UTF-8 text generation.
#[derive(Debug, Clone, Copy)]
pub enum Utf8Pattern {
    /// Pure ASCII (7-bit, single-byte sequences)
    Ascii,
    /// Latin Extended characters (2-byte sequences: accents, diacritics)
    Latin,
    /// Chinese/Japanese/Korean (3-byte sequences)
    Cjk,
    /// Emoji and symbols (4-byte sequences)
    Emoji,
    /// Mixed realistic content (prose with occasional non-ASCII)
    Mixed,
    /// Uniform mix of all sequence lengths (1-4 bytes)
    AllLengths,
    /// Multi-byte sequences cut by 16-byte block boundaries
    Straddle,
    /// Only the first and last code point of every range rule
    Pathological,
}

/// Bytes that never occur in well-formed UTF-8.
const NEVER_VALID: [u8; 13] = [
    0xC0, 0xC1, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF,
];

/// Seeded generator, or a deterministic cycle when no seed is given.
struct Picker {
    rng: Option<ChaCha8Rng>,
    counter: usize,
}

impl Picker {
    fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seed.map(ChaCha8Rng::seed_from_u64),
            counter: 0,
        }
    }

    /// Index in `0..len`.
    fn index(&mut self, len: usize) -> usize {
        self.counter += 1;
        let counter = self.counter;
        self.rng
            .as_mut()
            .map(|r| r.gen_range(0..len))
            .unwrap_or_else(|| counter.wrapping_mul(7919) % len)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.index(items.len())]
    }
}

/// Generate UTF-8 text of exactly `target_size` bytes.
pub fn generate_utf8(target_size: usize, pattern: Utf8Pattern, seed: Option<u64>) -> Vec<u8> {
    let mut picker = Picker::new(seed);
    let mut out = match pattern {
        Utf8Pattern::Ascii => words(target_size, &mut picker, ASCII_WORDS),
        Utf8Pattern::Latin => words(target_size, &mut picker, LATIN_WORDS),
        Utf8Pattern::Cjk => chars(target_size, &mut picker, CJK_CHARS, Some('。')),
        Utf8Pattern::Emoji => chars(target_size, &mut picker, EMOJI_CHARS, Some(' ')),
        Utf8Pattern::Mixed => mixed(target_size, &mut picker),
        Utf8Pattern::AllLengths => chars(target_size, &mut picker, ALL_LENGTH_CHARS, None),
        Utf8Pattern::Straddle => straddle(target_size, &mut picker),
        Utf8Pattern::Pathological => chars(target_size, &mut picker, EDGE_CHARS, None),
    };
    pad_to(&mut out, target_size);
    out
}

/// Overwrite up to `count` distinct positions of `data` with bytes that are
/// never valid UTF-8. Returns the positions, sorted.
pub fn corrupt(data: &mut [u8], count: usize, seed: Option<u64>) -> Vec<usize> {
    if data.is_empty() {
        return Vec::new();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed.unwrap_or(0) ^ 0x5EED_BAD0);
    let mut positions: Vec<usize> = (0..count.min(data.len()))
        .map(|_| rng.gen_range(0..data.len()))
        .collect();
    positions.sort_unstable();
    positions.dedup();

    for &pos in &positions {
        data[pos] = NEVER_VALID[rng.gen_range(0..NEVER_VALID.len())];
    }
    positions
}

const ASCII_WORDS: &[&str] = &[
    "The quick brown fox jumps over the lazy dog.",
    "Pack my box with five dozen liquor jugs.",
    "How vexingly quick daft zebras jump!",
    "Sphinx of black quartz, judge my vow.",
    "The five boxing wizards jump quickly.",
];

const LATIN_WORDS: &[&str] = &[
    "café", "résumé", "naïve", "über", "fiancée", "façade", "jalapeño", "señor", "mañana",
    "Ångström", "smörgåsbord", "Müller", "Größe", "Köln", "Zürich", "Ærø", "Łódź", "Kraków",
];

const CJK_CHARS: &[char] = &[
    '日', '本', '語', '中', '文', '字', '漢', '東', '京', '世', '界', '한', '국', '어', 'の', 'は',
];

const EMOJI_CHARS: &[char] = &['😀', '🎉', '🚀', '🌍', '🔥', '💯', '🦀', '🧪', '𝄞', '🗼'];

const ALL_LENGTH_CHARS: &[char] = &['a', 'Z', '7', 'é', 'ж', 'ß', '世', '€', '∑', '🎉', '🦀', '𝄞'];

const MIXED_EXTRAS: &[&str] = &["naïve", "Zürich", "東京", "→", "🎉", "Привет", "π≈3.14"];

/// Code points at the edges of each range rule.
const EDGE_CHARS: &[char] = &[
    '\u{7F}', '\u{80}', '\u{7FF}', '\u{800}', '\u{FFF}', '\u{1000}', '\u{CFFF}', '\u{D000}',
    '\u{D7FF}', '\u{E000}', '\u{FFFF}', '\u{10000}', '\u{3FFFF}', '\u{40000}', '\u{FFFFF}',
    '\u{100000}', '\u{10FFFF}',
];

/// Space-separated words with 80-column line breaks.
fn words(target_size: usize, picker: &mut Picker, pool: &[&str]) -> Vec<u8> {
    let mut out = Vec::with_capacity(target_size);
    let mut line_len = 0;
    loop {
        let word = picker.pick(pool).as_bytes();
        let sep = if line_len == 0 { 0 } else { 1 };
        if out.len() + sep + word.len() > target_size {
            break;
        }
        if line_len > 0 && line_len + word.len() + 1 > 80 {
            out.push(b'\n');
            line_len = 0;
        } else if sep > 0 {
            out.push(b' ');
            line_len += 1;
        }
        out.extend_from_slice(word);
        line_len += word.len();
    }
    out
}

/// Characters from `pool`, with `sep` after every eighth.
fn chars(target_size: usize, picker: &mut Picker, pool: &[char], sep: Option<char>) -> Vec<u8> {
    let mut out = Vec::with_capacity(target_size);
    let mut buf = [0u8; 4];
    let mut n = 0usize;
    loop {
        let c = match sep {
            Some(s) if n % 9 == 8 => s,
            _ => *picker.pick(pool),
        };
        let encoded = c.encode_utf8(&mut buf).as_bytes();
        if out.len() + encoded.len() > target_size {
            break;
        }
        out.extend_from_slice(encoded);
        n += 1;
    }
    out
}

/// ASCII prose with roughly one non-ASCII word in eight.
fn mixed(target_size: usize, picker: &mut Picker) -> Vec<u8> {
    let mut out = Vec::with_capacity(target_size);
    loop {
        let word = if picker.index(8) == 0 {
            *picker.pick(MIXED_EXTRAS)
        } else {
            *picker.pick(ASCII_WORDS)
        };
        if out.len() + word.len() + 1 > target_size {
            break;
        }
        out.extend_from_slice(word.as_bytes());
        out.push(if picker.index(10) == 0 { b'\n' } else { b' ' });
    }
    out
}

/// ASCII runs ending so that the next multi-byte character starts 1 to 3
/// bytes before a 16-byte boundary.
fn straddle(target_size: usize, picker: &mut Picker) -> Vec<u8> {
    const MULTI: &[char] = &['é', 'ж', '世', '€', '🎉', '𝄞', '\u{10FFFF}', '\u{E000}'];
    let mut out = Vec::with_capacity(target_size);
    let mut buf = [0u8; 4];
    loop {
        let c = *picker.pick(MULTI);
        let len = c.len_utf8();
        let before = 1 + picker.index(len - 1);
        let boundary = (out.len() / 16 + 1) * 16;
        let start = boundary - before;
        if start < out.len() || start + len > target_size {
            if boundary + 16 > target_size {
                break;
            }
            out.resize(boundary, b'.');
            continue;
        }
        out.resize(start, b'.');
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    out
}

/// Pad with ASCII spaces up to `target_size`.
fn pad_to(out: &mut Vec<u8>, target_size: usize) {
    debug_assert!(out.len() <= target_size);
    out.resize(target_size, b' ');
}
