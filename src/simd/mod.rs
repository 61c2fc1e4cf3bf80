//! Hardware block kernels.
//!
//! Each kernel runs the same block step as [`crate::text::range`] with
//! platform intrinsics and hands the tail to the shared driver.
//!
//! On x86_64, SSSE3 processes 16 bytes at a time and AVX2 32 bytes.
//! On ARM, NEON intrinsics process 16 bytes at a time.

#[cfg(target_arch = "aarch64")]
pub mod neon;

#[cfg(target_arch = "x86_64")]
pub mod x86;
