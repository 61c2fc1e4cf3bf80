//! utf8range CLI: validate, generate, benchmark and trace UTF-8 input.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use utf8range::Implementation;

mod bench;
mod generators;
mod trace;
mod validate;

#[derive(Debug, Parser)]
#[command(name = "utf8range")]
#[command(about = "Range-table UTF-8 validation toolkit", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate files (or stdin) as UTF-8
    Validate(validate::ValidateArgs),
    /// Generate synthetic UTF-8 files for benchmarking and testing
    Generate(GenerateArgs),
    /// Benchmark every available kernel over a directory of generated files
    Bench(BenchArgs),
    /// Dump each block's intermediate vectors
    Trace(trace::TraceArgs),
}

/// Generate synthetic UTF-8 files for benchmarking and testing
#[derive(Debug, Parser)]
struct GenerateArgs {
    /// Size of text to generate (supports b, kb, mb, gb - case insensitive)
    /// Examples: 1024, 1kb, 512MB, 2Gb
    #[arg(value_parser = parse_size)]
    size: usize,

    /// Output file path (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Content pattern to generate
    #[arg(short, long, default_value = "mixed")]
    pattern: PatternArg,

    /// Random seed for reproducible generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Overwrite this many random bytes with bytes that never occur in UTF-8
    #[arg(long, default_value = "0")]
    corrupt: usize,

    /// Verify the generated text against the standard library
    #[arg(long)]
    verify: bool,
}

/// Benchmark every available kernel
#[derive(Debug, Parser)]
struct BenchArgs {
    /// Directory holding <pattern>/<size>.txt files
    #[arg(long, default_value = "data/bench/generated/utf8")]
    data_dir: PathBuf,

    /// Kernels to run (default: all available)
    #[arg(long = "impl", value_delimiter = ',')]
    implementations: Vec<ImplArg>,

    /// Also time the rayon-parallel scan of each kernel
    #[arg(long)]
    parallel: bool,

    /// Timed runs per file and kernel (median is reported)
    #[arg(long, default_value = "3")]
    runs: usize,

    /// Stream results as JSON lines to this file
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// Write a markdown summary to this file
    #[arg(long)]
    markdown: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ImplArg {
    /// Widest kernel the CPU supports
    Auto,
    /// Byte-at-a-time sequence decoder
    Scalar,
    /// Range tables applied one byte at a time
    Stepwise,
    /// Range tables over portable 16-byte lanes
    Portable,
    /// SSSE3 (x86_64)
    Ssse3,
    /// AVX2 (x86_64)
    Avx2,
    /// NEON (aarch64)
    Neon,
}

impl From<ImplArg> for Implementation {
    fn from(arg: ImplArg) -> Self {
        match arg {
            ImplArg::Auto => Implementation::Auto,
            ImplArg::Scalar => Implementation::Scalar,
            ImplArg::Stepwise => Implementation::Stepwise,
            ImplArg::Portable => Implementation::Portable,
            ImplArg::Ssse3 => Implementation::Ssse3,
            ImplArg::Avx2 => Implementation::Avx2,
            ImplArg::Neon => Implementation::Neon,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PatternArg {
    /// Pure ASCII prose
    Ascii,
    /// Latin text with accents (2-byte sequences)
    Latin,
    /// Chinese/Japanese/Korean (3-byte sequences)
    Cjk,
    /// Emoji (4-byte sequences)
    Emoji,
    /// Mostly ASCII prose with occasional non-ASCII words
    Mixed,
    /// Uniform mix of all sequence lengths (1-4 bytes)
    AllLengths,
    /// Multi-byte sequences placed across 16-byte block boundaries
    Straddle,
    /// Only code points at the edges of each range rule
    Pathological,
}

impl From<PatternArg> for generators::Utf8Pattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Ascii => generators::Utf8Pattern::Ascii,
            PatternArg::Latin => generators::Utf8Pattern::Latin,
            PatternArg::Cjk => generators::Utf8Pattern::Cjk,
            PatternArg::Emoji => generators::Utf8Pattern::Emoji,
            PatternArg::Mixed => generators::Utf8Pattern::Mixed,
            PatternArg::AllLengths => generators::Utf8Pattern::AllLengths,
            PatternArg::Straddle => generators::Utf8Pattern::Straddle,
            PatternArg::Pathological => generators::Utf8Pattern::Pathological,
        }
    }
}

/// Parse size string like "1mb", "512KB", "2GB", "1024" (case insensitive)
fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim().to_lowercase();

    // Try parsing as plain number first
    if let Ok(bytes) = s.parse::<usize>() {
        return Ok(bytes);
    }

    // Parse with unit suffix
    let (num_str, unit) = if s.ends_with("gb") {
        (s.trim_end_matches("gb"), 1024 * 1024 * 1024)
    } else if s.ends_with("mb") {
        (s.trim_end_matches("mb"), 1024 * 1024)
    } else if s.ends_with("kb") {
        (s.trim_end_matches("kb"), 1024)
    } else if s.ends_with('b') {
        (s.trim_end_matches('b'), 1)
    } else {
        return Err(format!(
            "Invalid size format: '{}'. Use format like '1mb', '512KB', or '1024'",
            s
        ));
    };

    num_str
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(unit))
        .ok_or_else(|| format!("Invalid number in size: '{}'", s))
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut text = generators::generate_utf8(args.size, args.pattern.into(), args.seed);

    if args.corrupt > 0 {
        let positions = generators::corrupt(&mut text, args.corrupt, args.seed);
        eprintln!("✓ Corrupted {} byte(s)", positions.len());
    }

    if args.verify {
        let valid = std::str::from_utf8(&text).is_ok();
        anyhow::ensure!(
            valid == (args.corrupt == 0 || text.is_empty()),
            "Generated text is {} UTF-8",
            if valid { "valid" } else { "invalid" }
        );
        eprintln!("✓ Text verified ({})", if valid { "valid" } else { "invalid" });
    }

    match args.output {
        Some(path) => {
            std::fs::write(&path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✓ Wrote {} bytes to {}", text.len(), path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&text)
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

fn run_bench(args: BenchArgs) -> Result<()> {
    let implementations = if args.implementations.is_empty() {
        Implementation::available().collect()
    } else {
        args.implementations.into_iter().map(Into::into).collect()
    };

    let config = bench::BenchConfig {
        data_dir: args.data_dir,
        implementations,
        parallel: args.parallel,
        benchmark_runs: args.runs.max(1),
        ..bench::BenchConfig::default()
    };

    bench::run_benchmark(&config, args.jsonl.as_deref(), args.markdown.as_deref())?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => {
            let code = validate::run(args)?;
            std::process::exit(code);
        }
        Command::Generate(args) => run_generate(args),
        Command::Bench(args) => run_bench(args),
        Command::Trace(args) => trace::run(args),
    }
}
