//! Multi-threaded validation of large buffers.
//!
//! The whole-block prefix of the input is cut into block-aligned ranges that
//! are scanned on the rayon global pool. A range other than the first starts
//! from the carry of the block just before it, read straight from the input,
//! so no range depends on another range's result. The tail after the last
//! full block is resolved exactly as the sequential driver does.

use rayon::prelude::*;

use super::range::finish_tail;
use super::scalar::validate_utf8_scalar;
use super::utf8::{scan_blocks, SelectError, Validator};
use crate::Config;

/// Validate `input`, splitting it across threads when it is large enough.
///
/// Inputs shorter than [`Config::parallel_threshold`], and the `Scalar` and
/// `Stepwise` kernels, run sequentially. The verdict is identical to the
/// sequential one for every input and chunk size.
///
/// # Examples
///
/// ```
/// use utf8range::text::parallel::validate_utf8_parallel;
/// use utf8range::Config;
///
/// let config = Config {
///     parallel_threshold: 0,
///     parallel_chunk: 64,
///     ..Config::default()
/// };
/// let text = "parallel ünïcödé 🎉 ".repeat(100);
/// assert_eq!(validate_utf8_parallel(text.as_bytes(), &config), Ok(true));
/// ```
pub fn validate_utf8_parallel(input: &[u8], config: &Config) -> Result<bool, SelectError> {
    let validator = Validator::from_config(config)?;
    let imp = validator.implementation();

    let width = match imp.block_width() {
        Some(w) if w > 1 && input.len() >= config.parallel_threshold => w,
        _ => return Ok(validator.is_valid(input)),
    };
    if input.len() < width {
        return Ok(validate_utf8_scalar(input));
    }

    let full = input.len() - input.len() % width;
    let chunk = config.parallel_chunk.max(width).div_ceil(width) * width;

    let clean = input[..full]
        .par_chunks(chunk)
        .enumerate()
        .all(|(k, blocks)| {
            let prev = (k > 0).then(|| &input[..k * chunk]);
            scan_blocks(imp, blocks, prev)
        });

    Ok(clean && finish_tail(input, full))
}
