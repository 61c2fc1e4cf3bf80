//! UTF-8 validation benchmarking module.
//!
//! Times every requested kernel over a directory of generated files laid out
//! as `<data_dir>/<pattern>/<size>.txt` (see the `generate` command).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use utf8range::text::parallel::validate_utf8_parallel;
use utf8range::{Config, Implementation, Validator};

/// Benchmark result for a single file and kernel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub file: String,
    pub pattern: String,
    pub size: String,
    pub implementation: String,
    pub parallel: bool,
    pub filesize: u64,
    pub valid: bool,
    pub wall_time_ms: f64,
    pub throughput_mib_s: f64,
}

/// Configuration for the benchmark
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub data_dir: PathBuf,
    pub patterns: Vec<String>,
    pub sizes: Vec<String>,
    pub implementations: Vec<Implementation>,
    pub parallel: bool,
    pub warmup_runs: usize,
    pub benchmark_runs: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/bench/generated/utf8"),
            patterns: vec![
                "ascii".into(),
                "latin".into(),
                "cjk".into(),
                "emoji".into(),
                "mixed".into(),
                "all-lengths".into(),
                "straddle".into(),
                "pathological".into(),
            ],
            sizes: vec![
                "1kb".into(),
                "10kb".into(),
                "100kb".into(),
                "1mb".into(),
                "10mb".into(),
                "100mb".into(),
            ],
            implementations: Implementation::available().collect(),
            parallel: false,
            warmup_runs: 1,
            benchmark_runs: 3,
        }
    }
}

/// One timed configuration.
#[derive(Debug, Clone, Copy)]
struct Variant {
    implementation: Implementation,
    parallel: bool,
}

/// Run the UTF-8 benchmark suite
pub fn run_benchmark(
    config: &BenchConfig,
    output_jsonl: Option<&Path>,
    output_md: Option<&Path>,
) -> Result<Vec<BenchmarkResult>> {
    let mut results = Vec::new();

    let mut variants = Vec::new();
    for &imp in &config.implementations {
        let imp = Validator::new(imp)?.implementation();
        variants.push(Variant {
            implementation: imp,
            parallel: false,
        });
        if config.parallel && imp.block_width().is_some_and(|w| w > 1) {
            variants.push(Variant {
                implementation: imp,
                parallel: true,
            });
        }
    }

    // Set up Ctrl+C handler
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::SeqCst);
        eprintln!("\nInterrupted! Writing partial results...");
    })
    .context("Failed to set Ctrl+C handler")?;

    eprintln!("Running UTF-8 validation benchmark suite...");
    eprintln!("  Data directory: {}", config.data_dir.display());
    eprintln!(
        "  Kernels: {}",
        variants
            .iter()
            .map(variant_label)
            .collect::<Vec<_>>()
            .join(", ")
    );
    eprintln!("  Warmup runs: {}", config.warmup_runs);
    eprintln!("  Benchmark runs: {}", config.benchmark_runs);
    eprintln!();

    // Open JSONL file for streaming output if requested
    let mut jsonl_file = output_jsonl
        .map(|p| {
            std::fs::File::create(p).with_context(|| format!("Failed to create {}", p.display()))
        })
        .transpose()?;

    'outer: for pattern in &config.patterns {
        for size in &config.sizes {
            let file_path = config.data_dir.join(pattern).join(format!("{}.txt", size));

            if !file_path.exists() {
                eprintln!("  Skipping {} (not found)", file_path.display());
                continue;
            }

            let data = std::fs::read(&file_path)
                .with_context(|| format!("Failed to read {}", file_path.display()))?;

            for variant in &variants {
                // Check for Ctrl+C
                if interrupted.load(Ordering::SeqCst) {
                    break 'outer;
                }

                eprint!(
                    "  {} {} ({}) {}... ",
                    pattern,
                    size,
                    format_bytes(data.len()),
                    variant_label(variant)
                );
                std::io::stderr().flush()?;

                let result = benchmark_data(&data, &file_path, variant, config)?;
                eprintln!(
                    "{:.2}ms ({:.1} MiB/s){}",
                    result.wall_time_ms,
                    result.throughput_mib_s,
                    if result.valid { "" } else { " [INVALID]" }
                );

                // Write to JSONL immediately
                if let Some(ref mut f) = jsonl_file {
                    serde_json::to_writer(&mut *f, &result)?;
                    writeln!(f)?;
                    f.flush()?;
                }

                results.push(result);
            }
        }
    }

    // Write markdown summary if requested
    if let Some(md_path) = output_md {
        write_markdown_summary(&results, md_path)?;
    }

    // Print summary
    eprintln!();
    eprintln!("Completed {} benchmarks", results.len());

    Ok(results)
}

fn variant_label(variant: &Variant) -> String {
    if variant.parallel {
        format!("{}+parallel", variant.implementation)
    } else {
        variant.implementation.to_string()
    }
}

/// Time one kernel over one buffer
fn benchmark_data(
    data: &[u8],
    file_path: &Path,
    variant: &Variant,
    config: &BenchConfig,
) -> Result<BenchmarkResult> {
    let pattern = file_path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let size = file_path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let validator = Validator::new(variant.implementation)?;
    let lib_config = Config {
        implementation: variant.implementation,
        ..Config::default()
    };
    let check = |input: &[u8]| -> Result<bool> {
        if variant.parallel {
            Ok(validate_utf8_parallel(input, &lib_config)?)
        } else {
            Ok(validator.is_valid(input))
        }
    };

    // Warmup
    for _ in 0..config.warmup_runs {
        std::hint::black_box(check(data)?);
    }

    // Benchmark
    let mut times = Vec::with_capacity(config.benchmark_runs);
    let mut valid = false;
    for _ in 0..config.benchmark_runs {
        let start = Instant::now();
        valid = std::hint::black_box(check(std::hint::black_box(data))?);
        times.push(start.elapsed().as_secs_f64() * 1000.0);
    }
    times.sort_by(f64::total_cmp);
    let median = times[times.len() / 2];

    // Calculate throughput in MiB/s
    let throughput = (data.len() as f64 / (1024.0 * 1024.0)) / (median / 1000.0);

    Ok(BenchmarkResult {
        file: file_path.display().to_string(),
        pattern,
        size,
        implementation: variant.implementation.to_string(),
        parallel: variant.parallel,
        filesize: data.len() as u64,
        valid,
        wall_time_ms: median,
        throughput_mib_s: throughput,
    })
}

/// Write markdown summary
fn write_markdown_summary(results: &[BenchmarkResult], path: &Path) -> Result<()> {
    let mut md = String::new();

    md.push_str("# UTF-8 Validation Benchmark Results\n\n");
    md.push_str("Median wall time of `utf8range` kernels per input file.\n\n");

    // Group by pattern
    let mut patterns: Vec<&str> = results.iter().map(|r| r.pattern.as_str()).collect();
    patterns.sort();
    patterns.dedup();

    for pattern in patterns {
        md.push_str(&format!("## {}\n\n", pattern));
        md.push_str("| Size | Kernel | Time (ms) | Throughput (MiB/s) |\n");
        md.push_str("|------|--------|-----------|--------------------|\n");

        for result in results.iter().filter(|r| r.pattern == pattern) {
            let kernel = if result.parallel {
                format!("{}+parallel", result.implementation)
            } else {
                result.implementation.clone()
            };
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.1} |\n",
                result.size, kernel, result.wall_time_ms, result.throughput_mib_s
            ));
        }
        md.push('\n');
    }

    std::fs::write(path, md).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Format bytes as human-readable string
fn format_bytes(bytes: usize) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
