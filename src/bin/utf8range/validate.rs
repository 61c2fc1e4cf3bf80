//! CLI handler for the `validate` command.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use utf8range::text::parallel::validate_utf8_parallel;
use utf8range::{Config, Validator};

use crate::ImplArg;

/// Validate files for UTF-8 well-formedness.
#[derive(Debug, Parser)]
pub struct ValidateArgs {
    /// Input files to validate (reads from stdin if none provided)
    #[arg(trailing_var_arg = true)]
    pub files: Vec<PathBuf>,

    /// Quiet mode: exit code only, no output
    #[arg(short, long)]
    pub quiet: bool,

    /// Report every file, not just the invalid ones
    #[arg(short, long)]
    pub verbose: bool,

    /// Kernel to validate with
    #[arg(long = "impl", default_value = "auto")]
    pub implementation: ImplArg,

    /// Split large inputs across threads
    #[arg(long)]
    pub parallel: bool,

    /// Memory-map files instead of reading them
    #[arg(long)]
    pub mmap: bool,

    /// Force color output even when not a TTY
    #[arg(short = 'C', long = "color")]
    pub color: bool,

    /// Disable color output
    #[arg(short = 'M', long = "no-color")]
    pub no_color: bool,
}

/// Exit codes for the validate command.
pub mod exit_codes {
    /// UTF-8 is valid.
    pub const SUCCESS: i32 = 0;
    /// UTF-8 is invalid (validation error).
    pub const INVALID: i32 = 1;
    /// I/O error (file not found, permission denied, etc.).
    pub const IO_ERROR: i32 = 2;
    /// Requested kernel cannot run on this CPU. Shares the code of
    /// [`IO_ERROR`] so that 1 always means invalid input.
    pub const USAGE_ERROR: i32 = 2;
}

/// ANSI color codes for status output.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const OK: &str = "\x1b[1;32m"; // Bold green
    pub const LOCATION: &str = "\x1b[1;34m"; // Bold blue
}

/// Color scheme that can be disabled.
struct ColorScheme {
    error: &'static str,
    ok: &'static str,
    location: &'static str,
    reset: &'static str,
}

impl ColorScheme {
    fn new(use_color: bool) -> Self {
        if use_color {
            Self {
                error: colors::ERROR,
                ok: colors::OK,
                location: colors::LOCATION,
                reset: colors::RESET,
            }
        } else {
            Self {
                error: "",
                ok: "",
                location: "",
                reset: "",
            }
        }
    }
}

/// How one input is checked.
struct Checker {
    validator: Validator,
    config: Config,
    parallel: bool,
}

impl Checker {
    fn check(&self, input: &[u8]) -> Result<bool> {
        if self.parallel {
            Ok(validate_utf8_parallel(input, &self.config)?)
        } else {
            Ok(self.validator.is_valid(input))
        }
    }
}

/// Run the validate command.
pub fn run(args: ValidateArgs) -> Result<i32> {
    // Determine color output
    let use_color = if args.no_color {
        false
    } else if args.color {
        true
    } else {
        atty::is(atty::Stream::Stderr)
    };

    let scheme = ColorScheme::new(use_color);

    let config = Config {
        implementation: args.implementation.into(),
        ..Config::default()
    };
    let validator = match Validator::from_config(&config) {
        Ok(validator) => validator,
        Err(e) => {
            if !args.quiet {
                eprintln!("{}error{}: {}", scheme.error, scheme.reset, e);
            }
            return Ok(exit_codes::USAGE_ERROR);
        }
    };
    let checker = Checker {
        validator,
        config,
        parallel: args.parallel,
    };

    if args.verbose && !args.quiet {
        eprintln!("using {} kernel", validator.implementation());
    }

    if args.files.is_empty() {
        // Read from stdin
        let mut input = Vec::new();
        io::stdin()
            .read_to_end(&mut input)
            .context("failed to read from stdin")?;

        return report(checker.check(&input)?, "<stdin>", input.len(), &args, &scheme);
    }

    // Validate each file
    let mut any_invalid = false;
    let mut any_io_error = false;

    for path in &args.files {
        match check_file(path, &checker, args.mmap) {
            Ok((valid, len)) => {
                let name = path.to_string_lossy();
                if report(valid, &name, len, &args, &scheme)? == exit_codes::INVALID {
                    any_invalid = true;
                }
            }
            Err(e) => {
                any_io_error = true;
                if !args.quiet {
                    eprintln!(
                        "{}error{}: {}: {:#}",
                        scheme.error,
                        scheme.reset,
                        path.display(),
                        e
                    );
                }
            }
        }
    }

    if any_io_error {
        Ok(exit_codes::IO_ERROR)
    } else if any_invalid {
        Ok(exit_codes::INVALID)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Read or map `path` and validate it. Returns the verdict and file size.
fn check_file(path: &Path, checker: &Checker, mmap: bool) -> Result<(bool, usize)> {
    if mmap {
        let file = File::open(path).context("failed to open")?;
        let len = file.metadata().context("failed to stat")?.len();
        // Mapping an empty file fails on some platforms
        if len == 0 {
            return Ok((true, 0));
        }
        // SAFETY: the map is read-only and dropped before returning
        let map = unsafe { memmap2::Mmap::map(&file) }.context("failed to memory-map")?;
        Ok((checker.check(&map)?, map.len()))
    } else {
        let input = fs::read(path).context("failed to read")?;
        Ok((checker.check(&input)?, input.len()))
    }
}

/// Print the verdict for one input and return its exit code.
fn report(
    valid: bool,
    name: &str,
    len: usize,
    args: &ValidateArgs,
    scheme: &ColorScheme,
) -> Result<i32> {
    if valid {
        if args.verbose && !args.quiet {
            eprintln!(
                "{}ok{}: {}{}{} ({} bytes)",
                scheme.ok, scheme.reset, scheme.location, name, scheme.reset, len
            );
        }
        Ok(exit_codes::SUCCESS)
    } else {
        if !args.quiet {
            eprintln!(
                "{}error{}: {}{}{}: invalid UTF-8",
                scheme.error, scheme.reset, scheme.location, name, scheme.reset
            );
        }
        Ok(exit_codes::INVALID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utf8range::Implementation;

    fn args(extra: &[&str]) -> ValidateArgs {
        ValidateArgs::try_parse_from(std::iter::once("validate").chain(extra.iter().copied()))
            .unwrap()
    }

    fn unsupported() -> Option<&'static str> {
        Implementation::ALL
            .into_iter()
            .find(|imp| !imp.is_supported())
            .map(|imp| imp.name())
    }

    #[test]
    fn test_unsupported_kernel_is_not_reported_as_invalid() {
        let Some(name) = unsupported() else {
            return;
        };
        let code = run(args(&["-q", "--impl", name, "missing.txt"])).unwrap();
        assert_eq!(code, exit_codes::USAGE_ERROR);
        assert_ne!(code, exit_codes::INVALID);
    }

    #[test]
    fn test_exit_codes_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        std::fs::write(&good, "Grüße").unwrap();
        std::fs::write(&bad, [b'a', 0x80]).unwrap();

        let good = good.to_str().unwrap();
        let bad = bad.to_str().unwrap();
        assert_eq!(run(args(&["-q", good])).unwrap(), exit_codes::SUCCESS);
        assert_eq!(run(args(&["-q", good, bad])).unwrap(), exit_codes::INVALID);
        assert_eq!(
            run(args(&["-q", bad, "/nonexistent/utf8range.txt"])).unwrap(),
            exit_codes::IO_ERROR
        );
    }
}
