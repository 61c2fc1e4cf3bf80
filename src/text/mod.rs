//! UTF-8 validation.
//!
//! The validators here only answer whether a buffer is well-formed UTF-8.
//! They never report where it failed, and they never decode code points.
//!
//! ```
//! use utf8range::text::{is_valid_utf8, validate_utf8, Utf8Error};
//!
//! assert!(validate_utf8(b"Hello, world!").is_ok());
//! assert!(is_valid_utf8("日本語".as_bytes()));
//!
//! // Surrogate U+D800
//! assert_eq!(validate_utf8(&[0xED, 0xA0, 0x80]), Err(Utf8Error));
//! ```
//!
//! ## Layout
//!
//! - [`tables`] - the continuation-length and range-bound tables
//! - [`range`] - the block step over portable lanes, and the shared driver
//! - [`range_scalar`] - the block step one byte at a time
//! - [`scalar`] - the sequence decoder used for short inputs and tails
//! - [`utf8`] - kernel selection and the public entry points
//! - `parallel` - rayon-based scan of large buffers (feature `parallel`)

pub mod range;
pub mod range_scalar;
pub mod scalar;
pub mod tables;
pub mod utf8;

#[cfg(feature = "parallel")]
pub mod parallel;

// Re-export commonly used types
pub use utf8::{
    is_valid_utf8, validate_utf8, validate_utf8_with, Implementation, SelectError, Utf8Error,
    Validator,
};

#[cfg(feature = "parallel")]
pub use parallel::validate_utf8_parallel;
