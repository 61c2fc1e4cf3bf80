//! UTF-8 validation entry points and kernel selection.
//!
//! Every kernel answers the same question, valid or not, for the same
//! inputs. They differ only in how many bytes one block step covers:
//!
//! | Implementation | Block | Availability                         |
//! |----------------|-------|--------------------------------------|
//! | `Scalar`       | -     | everywhere                           |
//! | `Stepwise`     | 1     | everywhere                           |
//! | `Portable`     | 16    | everywhere                           |
//! | `Ssse3`        | 16    | x86_64 with SSSE3                    |
//! | `Avx2`         | 32    | x86_64 with AVX2                     |
//! | `Neon`         | 16    | aarch64                              |
//!
//! [`Implementation::Auto`] picks the widest kernel the running CPU supports.
//! With the `std` feature this is decided at runtime; without it only the
//! target features enabled at compile time count.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::range::{self, DEFAULT_WIDTH};
use super::range_scalar::validate_stepwise;
use super::scalar::validate_utf8_scalar;

#[cfg(target_arch = "aarch64")]
use crate::simd::neon;
#[cfg(target_arch = "x86_64")]
use crate::simd::x86;

/// The input is not well-formed UTF-8.
///
/// Carries no position: the block kernels defer the verdict to the end of
/// the scan and never know which byte failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utf8Error;

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid UTF-8")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Utf8Error {}

/// Error selecting a validation kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    /// The kernel is not compiled for this target or the CPU lacks it.
    UnsupportedImplementation(Implementation),
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedImplementation(imp) => {
                write!(f, "implementation `{}` is not supported on this CPU", imp)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SelectError {}

/// Validation kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Implementation {
    /// Widest supported kernel, chosen at call time.
    #[default]
    Auto,
    /// Byte-at-a-time sequence decoder.
    Scalar,
    /// Range tables applied one byte at a time.
    Stepwise,
    /// Range tables over portable 16-byte lanes.
    Portable,
    /// Range tables with SSSE3 intrinsics.
    Ssse3,
    /// Range tables with AVX2 intrinsics.
    Avx2,
    /// Range tables with NEON intrinsics.
    Neon,
}

impl Implementation {
    /// Every variant, `Auto` first.
    pub const ALL: [Implementation; 7] = [
        Self::Auto,
        Self::Scalar,
        Self::Stepwise,
        Self::Portable,
        Self::Ssse3,
        Self::Avx2,
        Self::Neon,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Scalar => "scalar",
            Self::Stepwise => "stepwise",
            Self::Portable => "portable",
            Self::Ssse3 => "ssse3",
            Self::Avx2 => "avx2",
            Self::Neon => "neon",
        }
    }

    /// Whether this kernel can run here.
    pub fn is_supported(self) -> bool {
        match self {
            Self::Auto | Self::Scalar | Self::Stepwise | Self::Portable => true,
            Self::Ssse3 => has_ssse3(),
            Self::Avx2 => has_avx2(),
            Self::Neon => has_neon(),
        }
    }

    /// Replace `Auto` with the concrete kernel it selects.
    ///
    /// Other variants are returned unchanged, supported or not.
    pub fn resolve(self) -> Implementation {
        match self {
            Self::Auto => detect(),
            other => other,
        }
    }

    /// Bytes per block step, or `None` for the sequence decoder.
    ///
    /// `Auto` reports the width of the kernel it currently resolves to.
    pub fn block_width(self) -> Option<usize> {
        match self.resolve() {
            Self::Scalar => None,
            Self::Stepwise => Some(1),
            Self::Portable => Some(DEFAULT_WIDTH),
            Self::Ssse3 | Self::Neon => Some(16),
            Self::Avx2 => Some(32),
            Self::Auto => unreachable!("resolve never returns Auto"),
        }
    }

    /// Concrete kernels supported here, widest last.
    pub fn available() -> impl Iterator<Item = Implementation> {
        Self::ALL
            .into_iter()
            .filter(|imp| *imp != Self::Auto && imp.is_supported())
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Implementation {
    type Err = UnknownImplementation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|imp| imp.name().eq_ignore_ascii_case(s))
            .ok_or(UnknownImplementation)
    }
}

/// The string does not name an [`Implementation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownImplementation;

impl fmt::Display for UnknownImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown implementation")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownImplementation {}

// =============================================================================
// CPU feature detection
// =============================================================================

#[cfg(all(target_arch = "x86_64", any(test, feature = "std")))]
fn has_avx2() -> bool {
    is_x86_feature_detected!("avx2")
}

#[cfg(all(target_arch = "x86_64", not(any(test, feature = "std"))))]
fn has_avx2() -> bool {
    cfg!(target_feature = "avx2")
}

#[cfg(all(target_arch = "x86_64", any(test, feature = "std")))]
fn has_ssse3() -> bool {
    is_x86_feature_detected!("ssse3")
}

#[cfg(all(target_arch = "x86_64", not(any(test, feature = "std"))))]
fn has_ssse3() -> bool {
    cfg!(target_feature = "ssse3")
}

#[cfg(not(target_arch = "x86_64"))]
fn has_avx2() -> bool {
    false
}

#[cfg(not(target_arch = "x86_64"))]
fn has_ssse3() -> bool {
    false
}

fn has_neon() -> bool {
    cfg!(all(target_arch = "aarch64", target_feature = "neon"))
}

/// Kernel `Auto` resolves to.
fn detect() -> Implementation {
    if cfg!(feature = "portable-only") {
        return Implementation::Portable;
    }
    if has_avx2() {
        Implementation::Avx2
    } else if has_ssse3() {
        Implementation::Ssse3
    } else if has_neon() {
        Implementation::Neon
    } else {
        Implementation::Portable
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Run a concrete, supported kernel over the whole input.
fn run(imp: Implementation, input: &[u8]) -> bool {
    debug_assert!(imp != Implementation::Auto && imp.is_supported());
    match imp {
        Implementation::Scalar => validate_utf8_scalar(input),
        Implementation::Stepwise => validate_stepwise(input),
        // SAFETY: callers only pass kernels that passed `is_supported`
        #[cfg(target_arch = "x86_64")]
        Implementation::Ssse3 => unsafe { x86::validate_ssse3(input) },
        #[cfg(target_arch = "x86_64")]
        Implementation::Avx2 => unsafe { x86::validate_avx2(input) },
        #[cfg(target_arch = "aarch64")]
        Implementation::Neon => unsafe { neon::validate_neon(input) },
        _ => range::validate::<DEFAULT_WIDTH>(input),
    }
}

/// Scan whole blocks of a concrete, supported block kernel.
///
/// `blocks.len()` must be a multiple of `imp.block_width()` and `prev`, if
/// given, at least one block long.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
pub(crate) fn scan_blocks(imp: Implementation, blocks: &[u8], prev: Option<&[u8]>) -> bool {
    debug_assert!(imp.is_supported());
    match imp {
        #[cfg(target_arch = "x86_64")]
        Implementation::Ssse3 => unsafe { x86::scan_blocks_ssse3(blocks, prev) },
        #[cfg(target_arch = "x86_64")]
        Implementation::Avx2 => unsafe { x86::scan_blocks_avx2(blocks, prev) },
        #[cfg(target_arch = "aarch64")]
        Implementation::Neon => unsafe { neon::scan_blocks_neon(blocks, prev) },
        _ => range::scan_blocks::<DEFAULT_WIDTH>(blocks, prev),
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Validate that the input is well-formed UTF-8.
///
/// Uses the widest kernel the CPU supports.
///
/// # Examples
///
/// ```
/// use utf8range::text::utf8::{validate_utf8, Utf8Error};
///
/// assert!(validate_utf8(b"Hello, world!").is_ok());
/// assert!(validate_utf8("日本語 🎉".as_bytes()).is_ok());
///
/// // Overlong encoding of U+0000
/// assert_eq!(validate_utf8(&[0xE0, 0x80, 0x80]), Err(Utf8Error));
/// ```
#[inline]
pub fn validate_utf8(input: &[u8]) -> Result<(), Utf8Error> {
    if run(detect(), input) {
        Ok(())
    } else {
        Err(Utf8Error)
    }
}

/// Returns `true` if the input is well-formed UTF-8.
#[inline]
pub fn is_valid_utf8(input: &[u8]) -> bool {
    run(detect(), input)
}

/// Validate with a specific kernel.
///
/// Returns the verdict, or an error if the kernel cannot run here.
///
/// # Examples
///
/// ```
/// use utf8range::text::utf8::{validate_utf8_with, Implementation};
///
/// assert_eq!(validate_utf8_with(&[0xC2, 0x80], Implementation::Stepwise), Ok(true));
/// assert_eq!(validate_utf8_with(&[0xF4, 0x90, 0x80, 0x80], Implementation::Portable), Ok(false));
/// ```
pub fn validate_utf8_with(input: &[u8], imp: Implementation) -> Result<bool, SelectError> {
    Ok(Validator::new(imp)?.is_valid(input))
}

/// A validator bound to one kernel, resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator {
    implementation: Implementation,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            implementation: detect(),
        }
    }
}

impl Validator {
    /// Bind to `imp`, resolving `Auto` now.
    pub fn new(imp: Implementation) -> Result<Self, SelectError> {
        let implementation = imp.resolve();
        if !implementation.is_supported() {
            return Err(SelectError::UnsupportedImplementation(implementation));
        }
        Ok(Self { implementation })
    }

    pub fn from_config(config: &crate::Config) -> Result<Self, SelectError> {
        Self::new(config.implementation)
    }

    /// The concrete kernel in use.
    pub fn implementation(&self) -> Implementation {
        self.implementation
    }

    pub fn validate(&self, input: &[u8]) -> Result<(), Utf8Error> {
        if self.is_valid(input) {
            Ok(())
        } else {
            Err(Utf8Error)
        }
    }

    #[inline]
    pub fn is_valid(&self, input: &[u8]) -> bool {
        run(self.implementation, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validators() -> impl Iterator<Item = Validator> {
        Implementation::available().map(|imp| Validator::new(imp).unwrap())
    }

    // =========================================================================
    // Valid UTF-8 Tests
    // =========================================================================

    mod valid_utf8 {
        use super::*;

        #[test]
        fn empty_input() {
            assert!(validate_utf8(b"").is_ok());
            for v in validators() {
                assert!(v.is_valid(b""), "{}", v.implementation());
            }
        }

        #[test]
        fn mixed_scripts() {
            let text = "Hello 世界! Привет мир! مرحبا 🎉 Ελληνικά";
            for v in validators() {
                assert!(v.is_valid(text.as_bytes()), "{}", v.implementation());
            }
        }

        #[test]
        fn boundary_code_points() {
            let text: String = ['\u{0}', '\u{7F}', '\u{80}', '\u{7FF}', '\u{800}', '\u{D7FF}']
                .iter()
                .chain(['\u{E000}', '\u{FFFF}', '\u{10000}', '\u{10FFFF}'].iter())
                .collect::<String>()
                .repeat(8);
            for v in validators() {
                assert!(v.is_valid(text.as_bytes()), "{}", v.implementation());
            }
        }

        #[test]
        fn lead_byte_straddles_block() {
            for width in [16usize, 32] {
                let mut input = vec![b'a'; width - 1];
                input.extend_from_slice(&[0xC2, 0x80]);
                for v in validators() {
                    assert!(v.is_valid(&input), "{} at {}", v.implementation(), width);
                }
            }
        }
    }

    // =========================================================================
    // Invalid UTF-8 Tests
    // =========================================================================

    mod invalid_utf8 {
        use super::*;

        #[test]
        fn error_displays() {
            assert_eq!(validate_utf8(&[0x80]), Err(Utf8Error));
            assert_eq!(Utf8Error.to_string(), "invalid UTF-8");
        }

        #[test]
        fn overlong_and_out_of_range() {
            for v in validators() {
                assert!(!v.is_valid(&[0xE0, 0x80, 0x80]), "{}", v.implementation());
                assert!(!v.is_valid(&[0xF4, 0x90, 0x80, 0x80]), "{}", v.implementation());
            }
        }

        #[test]
        fn lone_continuation_after_block() {
            for width in [16usize, 32] {
                let mut input = vec![b'a'; width];
                input.push(0x80);
                for v in validators() {
                    assert!(!v.is_valid(&input), "{} at {}", v.implementation(), width);
                }
            }
        }

        #[test]
        fn error_late_in_long_buffer() {
            let mut input = "ωmega ".repeat(200).into_bytes();
            let n = input.len();
            input[n - 40] = 0xFF;
            for v in validators() {
                assert!(v.validate(&input).is_err(), "{}", v.implementation());
            }
        }
    }

    // =========================================================================
    // Kernel selection
    // =========================================================================

    mod selection {
        use super::*;

        #[test]
        fn auto_resolves_to_concrete_kernel() {
            let imp = Implementation::Auto.resolve();
            assert_ne!(imp, Implementation::Auto);
            assert!(imp.is_supported());
            assert_eq!(Validator::default().implementation(), imp);
        }

        #[test]
        fn names_round_trip_through_from_str() {
            for imp in Implementation::ALL {
                assert_eq!(imp.name().parse::<Implementation>(), Ok(imp));
            }
            assert_eq!("AVX2".parse::<Implementation>(), Ok(Implementation::Avx2));
            assert!("sse9".parse::<Implementation>().is_err());
        }

        #[test]
        fn block_widths() {
            assert_eq!(Implementation::Scalar.block_width(), None);
            assert_eq!(Implementation::Stepwise.block_width(), Some(1));
            assert_eq!(Implementation::Portable.block_width(), Some(16));
            assert_eq!(Implementation::Avx2.block_width(), Some(32));
        }

        #[test]
        fn unsupported_kernel_is_rejected() {
            for imp in Implementation::ALL {
                let result = Validator::new(imp);
                if imp.is_supported() {
                    assert!(result.is_ok());
                } else {
                    assert_eq!(result, Err(SelectError::UnsupportedImplementation(imp)));
                    assert!(validate_utf8_with(b"x", imp).is_err());
                }
            }
        }

        #[cfg(not(target_arch = "aarch64"))]
        #[test]
        fn neon_unavailable_off_arm() {
            assert!(!Implementation::Neon.is_supported());
            let err = Validator::new(Implementation::Neon).unwrap_err();
            assert_eq!(
                err.to_string(),
                "implementation `neon` is not supported on this CPU"
            );
        }

        #[test]
        fn portable_always_available() {
            assert!(Implementation::available().any(|imp| imp == Implementation::Portable));
            assert!(Implementation::available().all(|imp| imp != Implementation::Auto));
        }
    }

    // =========================================================================
    // Comparison with core::str
    // =========================================================================

    mod std_comparison {
        use super::*;

        #[test]
        fn single_byte_mutations_agree() {
            let base = "κόσμε 世界 🎉 with some ascii padding, and more text ".repeat(2);
            let mut input = base.into_bytes();
            for i in 0..input.len() {
                let saved = input[i];
                for b in [0x00u8, 0x7F, 0x80, 0xBF, 0xC0, 0xC2, 0xE0, 0xED, 0xF0, 0xF4, 0xF5, 0xFF] {
                    input[i] = b;
                    let expected = core::str::from_utf8(&input).is_ok();
                    for v in validators() {
                        assert_eq!(
                            v.is_valid(&input),
                            expected,
                            "{} with {:02X} at {}",
                            v.implementation(),
                            b,
                            i
                        );
                    }
                }
                input[i] = saved;
            }
        }

        #[test]
        fn scan_blocks_resumes_at_any_block() {
            let input = "ascii, ünïcödé, 世界 and 🎉🎉 repeated ".repeat(16);
            let bytes = input.as_bytes();
            for v in validators() {
                let Some(width) = v.implementation().block_width().filter(|&w| w > 1) else {
                    continue;
                };
                let full = bytes.len() - bytes.len() % width;
                let whole = scan_blocks(v.implementation(), &bytes[..full], None);
                assert!(whole);
                for split in (width..full).step_by(width) {
                    let head = scan_blocks(v.implementation(), &bytes[..split], None);
                    let tail = scan_blocks(
                        v.implementation(),
                        &bytes[split..full],
                        Some(&bytes[..split]),
                    );
                    assert_eq!(head && tail, whole, "{} split {}", v.implementation(), split);
                }
            }
        }
    }
}
