//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use engine::analysis::{DEFAULT_IQR_MULTIPLIER, DEFAULT_TOP_GAPS, DEFAULT_TOP_PATTERNS};
use engine::MessageMode;

/// Log segmentation and conversion tool.
#[derive(Parser, Debug, Clone)]
#[command(name = "logseg-convert")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file, layered over the default locations.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert a plain log file into JSONL, one object per log entry.
    ToJsonl(ToJsonlArgs),

    /// Convert a JSONL file back into plain log lines.
    ToLog(ToLogArgs),

    /// Detect the timestamp format of a log file.
    Detect {
        /// Log file to inspect.
        input: PathBuf,
    },

    /// Count lens matches over a window of lines.
    Lens(LensArgs),

    /// List the longest time gaps between consecutive entries.
    Gaps {
        /// Log file to analyze.
        input: PathBuf,

        /// Number of gaps to report.
        #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_GAPS)]
        top: usize,
    },

    /// Descriptive statistics and outliers of the gaps between entries.
    Stats {
        /// Log file to analyze.
        input: PathBuf,

        /// IQR multiplier for the outlier fences (3.0 for far outliers).
        #[arg(long, default_value_t = DEFAULT_IQR_MULTIPLIER)]
        multiplier: f64,
    },

    /// Group timestamped lines that differ only in numbers.
    Similar {
        /// Log file to analyze.
        input: PathBuf,

        /// Number of patterns to report.
        #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_PATTERNS)]
        top: usize,
    },
}

/// Arguments for the to-jsonl command.
#[derive(Parser, Debug, Clone)]
pub struct ToJsonlArgs {
    /// Log file to convert.
    pub input: PathBuf,

    /// Output file (stdout when omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// How each entry's message is derived from its first line:
    /// minus-timestamp or as-is.
    #[arg(short, long, value_name = "MODE")]
    pub message_mode: Option<MessageMode>,

    /// Maximum lines kept per entry, first line included.
    #[arg(long, value_name = "LINES")]
    pub max_multiline_size: Option<usize>,

    /// Convert even when no timestamp format is detected.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the to-log command.
#[derive(Parser, Debug, Clone)]
pub struct ToLogArgs {
    /// JSONL file to convert.
    pub input: PathBuf,

    /// Field holding the timestamp (detected when omitted).
    #[arg(long)]
    pub timestamp_field: Option<String>,

    /// Field holding the log level (detected when omitted).
    #[arg(long)]
    pub level_field: Option<String>,

    /// Field holding the message (detected when omitted).
    #[arg(long)]
    pub message_field: Option<String>,

    /// Additional fields appended as name=value.
    #[arg(short, long = "extra", value_name = "FIELD")]
    pub extras: Vec<String>,

    /// Output file (defaults to <input stem>.log next to the input).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite the output file if it exists.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the lens command.
#[derive(Parser, Debug, Clone)]
pub struct LensArgs {
    /// Log file to scan.
    pub input: PathBuf,

    /// Pattern file (overrides lens.patterns_file).
    #[arg(short, long)]
    pub patterns: Option<PathBuf>,

    /// First line of the window (0-based).
    #[arg(long, default_value_t = 0)]
    pub from: usize,

    /// Last line of the window (inclusive, defaults to end of file).
    #[arg(long)]
    pub to: Option<usize>,

    /// Write the starter pattern file to --patterns and exit.
    #[arg(long, requires = "patterns")]
    pub init: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_to_jsonl() {
        let cli = Cli::try_parse_from([
            "logseg-convert",
            "to-jsonl",
            "app.log",
            "--message-mode",
            "as-is",
            "--max-multiline-size",
            "5",
            "--yes",
        ])
        .unwrap();

        match cli.command {
            Commands::ToJsonl(args) => {
                assert_eq!(args.input, PathBuf::from("app.log"));
                assert_eq!(args.message_mode, Some(MessageMode::FirstLineAsIs));
                assert_eq!(args.max_multiline_size, Some(5));
                assert!(args.yes);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_to_log_extras() {
        let cli = Cli::try_parse_from([
            "logseg-convert",
            "--config",
            "my.toml",
            "to-log",
            "app.jsonl",
            "-e",
            "pid",
            "--extra",
            "host",
            "--force",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
        match cli.command {
            Commands::ToLog(args) => {
                assert_eq!(args.extras, vec!["pid", "host"]);
                assert!(args.force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_message_mode_names() {
        let parse = |mode: &str| {
            match Cli::try_parse_from(["logseg-convert", "to-jsonl", "app.log", "-m", mode]) {
                Ok(Cli { command: Commands::ToJsonl(args), .. }) => args.message_mode,
                _ => None,
            }
        };
        assert_eq!(parse("minus-timestamp"), Some(MessageMode::FirstLineMinusTimestamp));
        assert_eq!(parse("firstLineAsIs"), Some(MessageMode::FirstLineAsIs));
        assert_eq!(parse("verbatim"), None);
    }

    #[test]
    fn test_parse_analysis_commands() {
        let cli = Cli::try_parse_from(["logseg-convert", "gaps", "app.log", "-n", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Gaps { top: 3, .. }));

        let cli = Cli::try_parse_from(["logseg-convert", "stats", "app.log"]).unwrap();
        match cli.command {
            Commands::Stats { multiplier, .. } => assert_eq!(multiplier, DEFAULT_IQR_MULTIPLIER),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["logseg-convert", "similar", "app.log"]).unwrap();
        assert!(matches!(cli.command, Commands::Similar { top: DEFAULT_TOP_PATTERNS, .. }));
    }

    #[test]
    fn test_lens_init_requires_patterns() {
        assert!(Cli::try_parse_from(["logseg-convert", "lens", "app.log", "--init"]).is_err());
    }
}
