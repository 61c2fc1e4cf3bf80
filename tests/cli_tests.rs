//! End-to-end tests for the `utf8range` binary.

#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn utf8range() -> Command {
    Command::new(env!("CARGO_BIN_EXE_utf8range"))
}

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_validate_valid_file_exits_zero() {
    let tmp = TempDir::new().unwrap();
    let path = write(&tmp, "ok.txt", "héllo wörld 🎉\n".repeat(100).as_bytes());

    let output = utf8range().arg("validate").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stderr.is_empty());
}

#[test]
fn test_validate_invalid_file_exits_one() {
    let tmp = TempDir::new().unwrap();
    let path = write(&tmp, "bad.txt", &[b'a', 0xE0, 0x80, 0x80]);

    let output = utf8range().arg("validate").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid UTF-8"), "{}", stderr);
}

#[test]
fn test_validate_missing_file_exits_two() {
    let tmp = TempDir::new().unwrap();
    let good = write(&tmp, "ok.txt", b"fine");

    let output = utf8range()
        .arg("validate")
        .arg(&good)
        .arg(tmp.path().join("missing.txt"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_validate_unsupported_kernel_exits_two() {
    let tmp = TempDir::new().unwrap();
    let path = write(&tmp, "ok.txt", b"fine");
    // Never both available on one target
    let kernel = if cfg!(target_arch = "aarch64") { "avx2" } else { "neon" };

    let output = utf8range()
        .args(["validate", "--no-color", "--impl", kernel])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not supported on this CPU"), "{}", stderr);
}

#[test]
fn test_generate_oversized_request_is_rejected() {
    let output = utf8range()
        .args(["generate", "99999999999999gb"])
        .stdout(Stdio::null())
        .output()
        .unwrap();
    // clap usage error, not a panic
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_validate_quiet_prints_nothing() {
    let tmp = TempDir::new().unwrap();
    let path = write(&tmp, "bad.txt", &[0xFF]);

    let output = utf8range()
        .args(["validate", "-q"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr.is_empty());
}

#[test]
fn test_validate_stdin() {
    let mut child = utf8range()
        .args(["validate", "--impl", "portable"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(&[0xED, 0xA0, 0x80])
        .unwrap();
    assert_eq!(child.wait().unwrap().code(), Some(1));
}

#[test]
fn test_validate_mmap_and_parallel_agree() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = "Grüße, 世界! ".repeat(50_000).into_bytes();
    let valid = write(&tmp, "valid.txt", &bytes);
    let last = bytes.len() - 1;
    bytes[last] = 0xC2;
    let invalid = write(&tmp, "invalid.txt", &bytes);
    let empty = write(&tmp, "empty.txt", b"");

    for flags in [&["--mmap"][..], &["--parallel"], &["--mmap", "--parallel"]] {
        for (path, code) in [(&valid, 0), (&invalid, 1), (&empty, 0)] {
            let output = utf8range()
                .arg("validate")
                .args(flags)
                .arg(path)
                .output()
                .unwrap();
            assert_eq!(output.status.code(), Some(code), "{:?} {}", flags, path.display());
        }
    }
}

#[test]
fn test_generate_output_is_valid() {
    let tmp = TempDir::new().unwrap();
    for pattern in ["ascii", "cjk", "emoji", "straddle", "pathological"] {
        let path = tmp.path().join(format!("{}.txt", pattern));
        let output = utf8range()
            .args(["generate", "4kb", "--verify", "--seed", "7", "-p", pattern, "-o"])
            .arg(&path)
            .output()
            .unwrap();
        assert!(output.status.success(), "generate {}", pattern);

        let text = std::fs::read(&path).unwrap();
        assert_eq!(text.len(), 4096);
        assert!(std::str::from_utf8(&text).is_ok(), "{}", pattern);
    }
}

#[test]
fn test_generate_corrupt_is_rejected_by_validate() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corrupt.txt");
    let output = utf8range()
        .args(["generate", "1kb", "--corrupt", "3", "--seed", "1", "-o"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = utf8range().arg("validate").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_trace_reports_blocks() {
    let tmp = TempDir::new().unwrap();
    let path = write(&tmp, "trace.txt", "abcdefgh\u{e9}ijklmnop".as_bytes());

    let output = utf8range()
        .args(["trace", "--width", "8"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("block @ 0x00000000"));
    assert!(stdout.contains("block @ 0x00000008"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("valid"));
}

#[test]
fn test_trace_rejects_odd_width() {
    let output = utf8range()
        .args(["trace", "--width", "12"])
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(!output.status.success());
}
