//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{ComparisonPeriod, MetricKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Longest range `trend` will render, about ten years.
pub const MAX_TREND_WEEKS: u32 = 520;

/// bodylog - weight and waist tracker
///
/// Log daily measurements and review weekly averages compared with the
/// previous week and with a 1, 2 or 4 week baseline.
///
/// Examples:
///   bodylog log weight 80.4
///   bodylog log waist 92 --date 2024-06-03 --notes "after run"
///   bodylog stats --week 2024-06-03 --period 4w
///   bodylog export --output backup.json
///   bodylog init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the JSON data file
    ///
    /// Overrides `data_file` from .bodylog.toml.
    #[arg(long, global = true, value_name = "FILE", env = "BODYLOG_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bodylog.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Skip the daily auto-backup for this invocation
    #[arg(long, global = true)]
    pub no_auto_backup: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show statistics for one week
    Stats {
        /// Any date inside the week (YYYY-MM-DD), defaults to today
        #[arg(short, long, value_name = "DATE")]
        week: Option<String>,

        /// Comparison baseline, defaults to the configured period
        #[arg(short, long, value_name = "PERIOD")]
        period: Option<ComparisonPeriod>,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show a week-by-week summary table
    Trend {
        /// Number of weeks to show, defaults to the configured count
        #[arg(long, value_name = "COUNT")]
        weeks: Option<u32>,

        /// Most recent week to include (YYYY-MM-DD), defaults to today
        #[arg(short, long, value_name = "DATE")]
        week: Option<String>,

        /// Comparison baseline, defaults to the configured period
        #[arg(short, long, value_name = "PERIOD")]
        period: Option<ComparisonPeriod>,
    },

    /// Record a measurement
    Log {
        kind: MetricKind,

        value: f64,

        /// Measurement date (YYYY-MM-DD), defaults to today
        #[arg(short, long, value_name = "DATE")]
        date: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Change the value or notes of an existing entry
    Edit {
        kind: MetricKind,

        id: String,

        value: f64,

        /// Replace the notes; omit to keep them, pass "" to clear them
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete an entry
    Delete { kind: MetricKind, id: String },

    /// List recorded entries, newest first
    History {
        kind: MetricKind,

        #[arg(long, default_value = "20", value_name = "COUNT")]
        limit: usize,
    },

    /// Write all entries to a backup file
    Export {
        /// Output file, defaults to bodylog-backup-<today>.json
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Replace all entries with the contents of a backup file
    Import {
        file: PathBuf,

        /// Validate the file without changing stored data
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the auto-backup now
    Backup {
        /// Write a backup even if one was already taken today
        #[arg(long)]
        force: bool,
    },

    /// Generate a default .bodylog.toml configuration file
    InitConfig,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Log { value, .. } | Command::Edit { value, .. } => {
                if !value.is_finite() || *value <= 0.0 {
                    return Err("Measurement value must be greater than 0".to_string());
                }
            }
            Command::Trend {
                weeks: Some(weeks), ..
            } => {
                if *weeks == 0 {
                    return Err("Weeks must be at least 1".to_string());
                }
                if *weeks > MAX_TREND_WEEKS {
                    return Err(format!("Weeks cannot exceed {}", MAX_TREND_WEEKS));
                }
            }
            Command::History { limit, .. } => {
                if *limit == 0 {
                    return Err("Limit must be at least 1".to_string());
                }
            }
            Command::Import { file, .. } => {
                if !file.is_file() {
                    return Err(format!("Backup file does not exist: {}", file.display()));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            data: None,
            config: None,
            verbose: false,
            quiet: false,
            no_auto_backup: false,
            command,
        }
    }

    #[test]
    fn test_parse_stats_command() {
        let args = Args::try_parse_from([
            "bodylog", "stats", "--week", "2024-06-03", "--period", "4w", "--format", "json",
        ])
        .unwrap();

        match args.command {
            Command::Stats {
                week,
                period,
                format,
                output,
            } => {
                assert_eq!(week.as_deref(), Some("2024-06-03"));
                assert_eq!(period, Some(ComparisonPeriod::FourWeeks));
                assert_eq!(format, OutputFormat::Json);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_period() {
        let result = Args::try_parse_from(["bodylog", "stats", "--period", "3w"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_log_command() {
        let args =
            Args::try_parse_from(["bodylog", "log", "waist", "92.5", "--notes", "after run"])
                .unwrap();
        assert!(matches!(
            args.command,
            Command::Log {
                kind: MetricKind::Waist,
                ..
            }
        ));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_positive_value() {
        let args = make_args(Command::Log {
            kind: MetricKind::Weight,
            value: 0.0,
            date: None,
            notes: None,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_weeks() {
        let args = make_args(Command::Trend {
            weeks: Some(0),
            week: None,
            period: None,
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_weeks_cap() {
        let at_cap = make_args(Command::Trend {
            weeks: Some(MAX_TREND_WEEKS),
            week: None,
            period: None,
        });
        assert!(at_cap.validate().is_ok());

        let over = make_args(Command::Trend {
            weeks: Some(14_000_000),
            week: None,
            period: None,
        });
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
