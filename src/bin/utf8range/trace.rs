//! CLI handler for the `trace` command.
//!
//! Prints the intermediate vectors of the portable kernel for every full
//! block, followed by the tail handoff and the final verdict.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use utf8range::text::range::{self, lookahead, BlockTrace, BlockTracer, Lanes};

/// Dump each block's bytes, continuation lengths, range indices and
/// violations.
#[derive(Debug, Parser)]
pub struct TraceArgs {
    /// Input file (reads from stdin if omitted)
    pub file: Option<PathBuf>,

    /// Lanes per block: 4, 8, 16, 32 or 64
    #[arg(short, long, default_value = "16")]
    pub width: usize,

    /// Only print blocks with at least one violation
    #[arg(long)]
    pub violations_only: bool,

    /// Force color output even when not a TTY
    #[arg(short = 'C', long = "color")]
    pub color: bool,
}

const RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Run the trace command.
pub fn run(args: TraceArgs) -> Result<()> {
    let input = match &args.file {
        Some(path) => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        None => {
            let mut input = Vec::new();
            io::stdin()
                .read_to_end(&mut input)
                .context("failed to read from stdin")?;
            input
        }
    };

    let color = args.color || atty::is(atty::Stream::Stdout);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let options = Options {
        color,
        violations_only: args.violations_only,
    };

    let valid = match args.width {
        4 => write_trace::<4>(&input, &mut out, options)?,
        8 => write_trace::<8>(&input, &mut out, options)?,
        16 => write_trace::<16>(&input, &mut out, options)?,
        32 => write_trace::<32>(&input, &mut out, options)?,
        64 => write_trace::<64>(&input, &mut out, options)?,
        other => bail!("unsupported width {} (expected 4, 8, 16, 32 or 64)", other),
    };
    out.flush()?;

    eprintln!("{}", if valid { "valid" } else { "invalid" });
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
struct Options {
    color: bool,
    violations_only: bool,
}

/// Write the trace of `input` and return the verdict.
fn write_trace<const W: usize>(
    input: &[u8],
    out: &mut impl Write,
    options: Options,
) -> Result<bool> {
    let mut tracer = BlockTracer::<W>::new(input);
    let mut clean = true;
    let mut blocks = 0usize;

    for trace in tracer.by_ref() {
        blocks += 1;
        let violated = trace.violation.any();
        clean &= !violated;
        if options.violations_only && !violated {
            continue;
        }
        write_block(&trace, out, options)?;
    }

    let full = blocks * W;
    if full == 0 {
        writeln!(out, "short input ({} bytes): scalar only", input.len())?;
    } else if !clean {
        writeln!(out, "violations found in full blocks")?;
    } else {
        // Displayed only; the verdict below reruns the real driver
        let back = lookahead(&input[full - 3..full]);
        writeln!(
            out,
            "tail: {} bytes from 0x{:08x} (rewound {}, remainder {})",
            input.len() - (full - back),
            full - back,
            back,
            tracer.remainder().len()
        )?;
    }

    Ok(range::validate::<W>(input))
}

fn write_block<const W: usize>(
    trace: &BlockTrace<W>,
    out: &mut impl Write,
    options: Options,
) -> Result<()> {
    writeln!(out, "block @ 0x{:08x}", trace.offset)?;
    write_row(out, "bytes", &trace.bytes, &trace.violation, options)?;
    write_row(out, "follow", &trace.follow, &trace.violation, options)?;
    write_row(out, "range", &trace.range, &trace.violation, options)?;

    write!(out, "  {:<9}", "violation")?;
    for &v in trace.violation.0.iter() {
        write!(out, " {}", if v != 0 { "^^" } else { ".." })?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_row<const W: usize>(
    out: &mut impl Write,
    label: &str,
    lanes: &Lanes<W>,
    violation: &Lanes<W>,
    options: Options,
) -> Result<()> {
    write!(out, "  {:<9}", label)?;
    for (&b, &v) in lanes.0.iter().zip(violation.0.iter()) {
        if options.color && v != 0 {
            write!(out, " {}{:02x}{}", RED, b, RESET)?;
        } else {
            write!(out, " {:02x}", b)?;
        }
    }
    writeln!(out)?;
    Ok(())
}
