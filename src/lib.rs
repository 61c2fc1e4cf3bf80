//! # utf8range
//!
//! Vectorized UTF-8 validation with range tables.
//!
//! Each byte of a block is assigned a *range index* from its own
//! continuation length, the continuation lengths of up to three bytes before
//! it, and whether the byte just before it is `E0`, `ED`, `F0` or `F4`. The
//! index selects an inclusive `[min, max]` bound, and a byte outside its
//! bound is a violation. Violations are ORed across the whole buffer and
//! checked once, after the last full block; a short scalar pass then covers
//! the unaligned tail.
//!
//! ## Module Organization
//!
//! - [`text`] - validators, kernel selection and the public entry points
//! - [`simd`] - SSSE3/AVX2 (x86_64) and NEON (aarch64) block kernels
//!
//! ## Quick Start
//!
//! ```
//! use utf8range::text::{validate_utf8, Implementation, Validator};
//!
//! assert!(validate_utf8("Grüße, 世界 🎉".as_bytes()).is_ok());
//! assert!(validate_utf8(&[0xC0, 0xAF]).is_err());
//!
//! // Pin a kernel
//! let validator = Validator::new(Implementation::Portable).unwrap();
//! assert!(validator.is_valid(b"plain ascii"));
//! ```
//!
//! ## Features
//!
//! - `std` (default) - runtime CPU feature detection for `Implementation::Auto`
//! - `portable-only` - `Auto` always selects the portable lane kernel
//! - `parallel` - [`text::parallel`] scan on the rayon global pool
//! - `serde` - serialization of [`Config`] and [`text::Implementation`]
//! - `cli` - the `utf8range` binary

// Use no_std unless std feature is enabled or we're in test mode
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Core modules
// =============================================================================

/// UTF-8 validation.
pub mod text;

/// Platform-specific block kernels.
pub mod simd;

// =============================================================================
// Public re-exports
// =============================================================================

pub use text::{is_valid_utf8, validate_utf8, Implementation, Utf8Error, Validator};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for validation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Kernel to run (default: `Auto`)
    pub implementation: Implementation,
    /// Smallest input split across threads (default: 1 MiB)
    pub parallel_threshold: usize,
    /// Bytes per parallel range, rounded up to whole blocks (default: 256 KiB)
    pub parallel_chunk: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            implementation: Implementation::Auto,
            parallel_threshold: 1024 * 1024,
            parallel_chunk: 256 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.implementation, Implementation::Auto);
        assert_eq!(config.parallel_threshold, 1 << 20);
        assert_eq!(config.parallel_chunk, 1 << 18);
    }

    #[test]
    fn validator_from_config() {
        let config = Config {
            implementation: Implementation::Stepwise,
            ..Config::default()
        };
        let validator = Validator::from_config(&config).unwrap();
        assert_eq!(validator.implementation(), Implementation::Stepwise);
        assert!(validator.validate(&[0xF0, 0x9F, 0x8E, 0x89]).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_from_json() {
        let config: Config =
            serde_json::from_str(r#"{"implementation":"portable","parallel_chunk":4096}"#)
                .unwrap();
        assert_eq!(config.implementation, Implementation::Portable);
        assert_eq!(config.parallel_chunk, 4096);
        assert_eq!(config.parallel_threshold, Config::default().parallel_threshold);
    }
}
