mod analyze;
mod cli;
mod config;
mod error;
mod lens;
mod orchestrator;
mod to_log;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use engine::export::write_jsonl;
use engine::timestamp::TimestampDetector;
use tracing::{info, warn};

use crate::{
    cli::{Cli, Commands, LensArgs, ToJsonlArgs},
    config::{ConvertConfig, LogFormat},
    orchestrator::{file_dates, read_log_lines, Orchestrator},
};

fn main() -> Result<()> {
    // Phase 1: Basic tracing so we can log during config loading
    // Uses set_default (thread-local) so it can be replaced by Phase 2's global subscriber
    let basic_tracing = init_tracing_basic();

    let cli = Cli::parse();

    let config = ConvertConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    config.validate()
        .context("Configuration validation failed")?;

    // Phase 2: Re-initialize tracing with config (format, level)
    // Drop the phase-1 thread-local guard so the global subscriber slot is free
    drop(basic_tracing);
    init_tracing_from_config(&config);

    match &cli.command {
        Commands::ToJsonl(args) => run_to_jsonl(&config, args),
        Commands::ToLog(args) => {
            let (output, stats) = to_log::run(args)?;
            let note = if stats.lines_skipped > 0 {
                format!(" ({} non-JSON lines passed through)", stats.lines_skipped)
            } else {
                String::new()
            };
            println!("Converted {} lines -> {}{}", stats.lines_written, output.display(), note);
            Ok(())
        }
        Commands::Detect { input } => run_detect(&config, input),
        Commands::Lens(args) => run_lens(&config, args),
        Commands::Gaps { input, top } => {
            let top = analyze::gaps(&build_orchestrator(&config)?, input, &config.jsonl, *top)?;
            println!("{}", analyze::render_gaps(&top));
            Ok(())
        }
        Commands::Stats { input, multiplier } => {
            if !(multiplier.is_finite() && *multiplier >= 0.0) {
                anyhow::bail!("--multiplier must be a non-negative number");
            }
            let result = analyze::stats(&build_orchestrator(&config)?, input, &config.jsonl, *multiplier)?;
            println!("{}", analyze::render_stats(&result));
            Ok(())
        }
        Commands::Similar { input, top } => {
            let result = analyze::similar(&build_orchestrator(&config)?, input, *top)?;
            println!("{}", analyze::render_similar(&result));
            Ok(())
        }
    }
}

fn build_orchestrator(config: &ConvertConfig) -> Result<Orchestrator<TimestampDetector>> {
    let fallback = config.detection.fallback_matcher()
        .context("Invalid detection fallback")?;
    Ok(Orchestrator::new(detector(config)?, fallback))
}

fn detector(config: &ConvertConfig) -> Result<TimestampDetector> {
    TimestampDetector::with_sample_size(config.detection.sample_lines)
        .context("Failed to build timestamp detector")
}

fn run_to_jsonl(config: &ConvertConfig, args: &ToJsonlArgs) -> Result<()> {
    // Command-line flags override configuration
    let mut options = config.jsonl.clone();
    if let Some(mode) = args.message_mode {
        options.message_mode = mode;
    }
    if let Some(max) = args.max_multiline_size {
        options.max_multiline_size = max;
    }
    options.validate().context("Invalid conversion options")?;

    let outcome = build_orchestrator(config)?.convert_file(&args.input, &options, args.yes)?;

    let written = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let count = write_jsonl(&mut BufWriter::new(file), &outcome.records)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(output = %path.display(), entries = count, "JSONL written");
            count
        }
        None => {
            let stdout = io::stdout();
            write_jsonl(&mut stdout.lock(), &outcome.records)
                .context("Failed to write JSONL to stdout")?
        }
    };

    if outcome.stats.truncated_records > 0 {
        warn!(
            records = outcome.stats.truncated_records,
            dropped_lines = outcome.stats.dropped_lines,
            "Some entries exceeded max_multiline_size and were truncated"
        );
    }
    info!(entries = written, source = %outcome.source, "Done");
    Ok(())
}

fn run_detect(config: &ConvertConfig, input: &std::path::Path) -> Result<()> {
    let lines = read_log_lines(input)?;
    let dates = file_dates(input)?;
    let result = Orchestrator::new(detector(config)?, None).detect(&lines, dates);

    if !result.detected() {
        warn!(file = %input.display(), lines_scanned = result.lines_scanned, "No timestamp format detected");
    }
    println!("{}", result.display());
    Ok(())
}

fn run_lens(config: &ConvertConfig, args: &LensArgs) -> Result<()> {
    if args.init {
        if let Some(path) = &args.patterns {
            let created = engine::lens::write_starter_patterns(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if created {
                println!("Created {}", path.display());
            } else {
                println!("{} already exists", path.display());
            }
        }
        return Ok(());
    }

    if !config.lens.enabled {
        warn!("Lenses are disabled (lens.enabled = false)");
        return Ok(());
    }

    let entries = lens::load_entries(args.patterns.as_deref(), &config.lens)?;
    let lines = read_log_lines(&args.input)?;
    let report = lens::scan(&lines, entries, args.from, args.to);

    let mut out = io::stdout().lock();
    writeln!(out, "{}", lens::render(&report)).context("Failed to write lens report")?;
    Ok(())
}

/// Phase 1: Basic tracing init so we can log during config loading.
/// Uses RUST_LOG env var or a sensible default.
fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,convert=info"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: Re-initialize tracing with configuration values.
/// Logs always go to stderr; stdout carries command output.
fn init_tracing_from_config(config: &ConvertConfig) {
    use tracing_subscriber::{fmt, EnvFilter, prelude::*};

    // Prefer RUST_LOG env var, fall back to config level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_target(true)
                .with_thread_ids(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}
