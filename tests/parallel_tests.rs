//! The rayon scan must agree with the sequential scan for every split.

#![cfg(feature = "parallel")]

use proptest::prelude::*;
use utf8range::text::parallel::validate_utf8_parallel;
use utf8range::{Config, Implementation, Validator};

fn config(implementation: Implementation, chunk: usize) -> Config {
    Config {
        implementation,
        parallel_threshold: 0,
        parallel_chunk: chunk,
    }
}

fn block_kernels() -> Vec<Implementation> {
    Implementation::available()
        .filter(|imp| imp.block_width().is_some_and(|w| w > 1))
        .collect()
}

#[test]
fn test_large_valid_buffer() {
    let input = "parallel scan: κόσμε, 世界, 🎉 and ascii\n".repeat(20_000);
    for imp in block_kernels() {
        assert_eq!(
            validate_utf8_parallel(input.as_bytes(), &config(imp, 4096)),
            Ok(true),
            "{}",
            imp
        );
    }
}

#[test]
fn test_error_in_each_range() {
    let base = "Grüße 🌍 ".repeat(4000).into_bytes();
    let chunk = 1024;
    for imp in block_kernels() {
        for at in (0..base.len()).step_by(chunk).chain([base.len() - 1]) {
            let mut input = base.clone();
            input[at] = 0xFF;
            assert_eq!(
                validate_utf8_parallel(&input, &config(imp, chunk)),
                Ok(false),
                "{} at {}",
                imp,
                at
            );
        }
    }
}

#[test]
fn test_sequence_across_every_range_start() {
    let chunk = 64;
    for imp in block_kernels() {
        let mut input = Vec::new();
        while input.len() < 64 * 40 {
            let boundary = (input.len() / chunk + 1) * chunk;
            input.resize(boundary - 2, b'.');
            input.extend_from_slice("\u{10348}".as_bytes());
        }
        assert_eq!(validate_utf8_parallel(&input, &config(imp, chunk)), Ok(true), "{}", imp);

        // Same layout with the lead bytes removed
        let orphaned: Vec<u8> = input.iter().map(|&b| if b == 0xF0 { b'.' } else { b }).collect();
        assert_eq!(validate_utf8_parallel(&orphaned, &config(imp, chunk)), Ok(false), "{}", imp);
    }
}

#[test]
fn test_unsupported_kernel_is_an_error() {
    for imp in Implementation::ALL {
        if !imp.is_supported() {
            assert!(validate_utf8_parallel(b"abc", &config(imp, 16)).is_err());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_parallel_equals_sequential(
        bytes in prop::collection::vec(
            prop_oneof![
                4 => any::<char>().prop_map(|c| c.to_string().into_bytes()),
                1 => prop::collection::vec(any::<u8>(), 1..3),
            ],
            0..400,
        ),
        chunk in 1usize..300,
    ) {
        let input: Vec<u8> = bytes.concat();
        for imp in block_kernels() {
            let sequential = Validator::new(imp).unwrap().is_valid(&input);
            prop_assert_eq!(
                validate_utf8_parallel(&input, &config(imp, chunk)),
                Ok(sequential)
            );
            prop_assert_eq!(sequential, core::str::from_utf8(&input).is_ok());
        }
    }
}
