//! JSONL to plain log conversion.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use engine::export::{convert_jsonl_to_log, detect_fields, ConversionStats, LogLineLayout, FIELD_SAMPLE_LINES};
use tracing::{info, warn};

use crate::cli::ToLogArgs;
use crate::error::ConvertError;

/// `<stem>.log` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("log")
}

/// Detected layout with command-line choices applied on top.
pub fn resolve_layout(fields: &[String], args: &ToLogArgs) -> LogLineLayout {
    let mut layout = LogLineLayout::suggest(fields);
    if args.timestamp_field.is_some() {
        layout.timestamp = args.timestamp_field.clone();
    }
    if args.level_field.is_some() {
        layout.level = args.level_field.clone();
    }
    if args.message_field.is_some() {
        layout.message = args.message_field.clone();
    }

    for extra in &args.extras {
        if !fields.contains(extra) {
            warn!(field = %extra, "Extra field not seen in the sampled lines");
        }
    }
    layout.extras = args.extras.clone();
    layout
}

pub fn run(args: &ToLogArgs) -> Result<(PathBuf, ConversionStats)> {
    let input = &args.input;
    let open = || File::open(input).with_context(|| format!("Failed to open {}", input.display()));

    let fields = detect_fields(BufReader::new(open()?), FIELD_SAMPLE_LINES)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    if fields.is_empty() {
        return Err(ConvertError::NoFields(input.display().to_string()).into());
    }

    let layout = resolve_layout(&fields, args);
    info!(
        timestamp = ?layout.timestamp,
        level = ?layout.level,
        message = ?layout.message,
        extras = ?layout.extras,
        unused = ?layout.unused(&fields),
        "Field layout selected"
    );

    let output = args.output.clone().unwrap_or_else(|| default_output_path(input));
    if output == *input {
        anyhow::bail!("Output path {} is the input file", output.display());
    }
    if output.exists() && !args.force {
        return Err(ConvertError::OutputExists(output.display().to_string()).into());
    }

    let reader = BufReader::new(open()?);
    let file = File::create(&output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    let stats = match convert_jsonl_to_log(reader, &mut writer, &layout) {
        Ok(stats) => stats,
        Err(e) => {
            drop(writer);
            // Leave no partial output behind
            if let Err(remove) = fs::remove_file(&output) {
                warn!(output = %output.display(), error = %remove, "Failed to remove partial output");
            }
            return Err(anyhow::Error::new(e).context(format!("Failed to convert {}", input.display())));
        }
    };

    info!(
        written = stats.lines_written,
        passed_through = stats.lines_skipped,
        output = %output.display(),
        "JSONL converted to log"
    );
    Ok((output, stats))
}
