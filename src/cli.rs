//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use attendbook::models::{AttendanceStatus, BulkFill};
use attendbook::report::OutputFormat;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;

/// Attendbook - class attendance ledger
///
/// Record daily attendance per class and print daily, per-student,
/// monthly and year-end reports from flat JSON documents.
///
/// Examples:
///   attendbook classes
///   attendbook mark --class ClassA --absent Bob --late Carol
///   attendbook mark --class ClassA --date 2024-03-01 --fill absent --present Alice
///   attendbook monthly --year 2024 --month 3 --format json
///   attendbook awards --year 2024
///   attendbook init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .attendbook.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Roster document (class name -> list of students)
    #[arg(long, global = true, value_name = "FILE", env = "ATTENDBOOK_ROSTER")]
    pub roster: Option<PathBuf>,

    /// Attendance document (date -> class -> student -> status)
    #[arg(long, global = true, value_name = "FILE", env = "ATTENDBOOK_RECORDS")]
    pub attendance: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, global = true, value_name = "FORMAT")]
    pub format: Option<FormatArg>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List classes and their students
    Classes,

    /// Record one day's attendance for a class
    Mark {
        #[arg(long)]
        class: String,
        /// Date to record (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Status every student starts with before overrides
        #[arg(long, value_enum, default_value_t = FillMode::Default)]
        fill: FillMode,
        /// Students to mark present (comma-separated)
        #[arg(long, value_delimiter = ',', value_name = "NAMES")]
        present: Vec<String>,
        /// Students to mark absent (comma-separated)
        #[arg(long, value_delimiter = ',', value_name = "NAMES")]
        absent: Vec<String>,
        /// Students to mark late (comma-separated)
        #[arg(long, value_delimiter = ',', value_name = "NAMES")]
        late: Vec<String>,
    },

    /// Show every class recorded on a date
    Daily {
        /// Defaults to the most recent recorded date
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show one student's history and summary
    Student {
        #[arg(long)]
        class: String,
        #[arg(long)]
        student: String,
    },

    /// Summarize every class for one month
    Monthly {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },

    /// Month-by-month statistics for a class
    Analytics {
        #[arg(long)]
        class: String,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Month-by-month rates for one student
    Progress {
        #[arg(long)]
        class: String,
        #[arg(long)]
        student: String,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Year-end attendance awards
    Awards {
        #[arg(long)]
        year: Option<i32>,
        /// Minimum recorded days to qualify (overrides config)
        #[arg(long, value_name = "DAYS")]
        min_days: Option<usize>,
    },

    /// Generate a default .attendbook.toml configuration file
    InitConfig,
}

/// Bulk-fill mode for `mark`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FillMode {
    /// Everyone starts present
    Present,
    /// Everyone starts absent
    Absent,
    /// Leave the default (present)
    Default,
}

impl From<FillMode> for BulkFill {
    fn from(mode: FillMode) -> Self {
        match mode {
            FillMode::Present => BulkFill::AllPresent,
            FillMode::Absent => BulkFill::AllAbsent,
            FillMode::Default => BulkFill::Default,
        }
    }
}

/// Report format accepted by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatArg {
    /// Markdown tables
    Markdown,
    /// Pretty-printed JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
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

        if let Command::Mark {
            present,
            absent,
            late,
            ..
        } = &self.command
        {
            let mut seen = HashSet::new();
            for name in present.iter().chain(absent).chain(late) {
                if name.trim().is_empty() {
                    return Err("Student names must not be empty".to_string());
                }
                if !seen.insert(name.as_str()) {
                    return Err(format!("Student '{}' is given more than one status", name));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file; `--quiet`
    /// still wins over it.
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

/// Per-student overrides collected from `--present`, `--absent` and `--late`.
pub fn status_overrides(
    present: &[String],
    absent: &[String],
    late: &[String],
) -> Vec<(String, AttendanceStatus)> {
    let tagged = |names: &[String], status: AttendanceStatus| {
        names
            .iter()
            .map(move |name| (name.trim().to_string(), status))
            .collect::<Vec<_>>()
    };

    let mut overrides = tagged(present, AttendanceStatus::Present);
    overrides.extend(tagged(absent, AttendanceStatus::Absent));
    overrides.extend(tagged(late, AttendanceStatus::Late));
    overrides
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            roster: None,
            attendance: None,
            format: None,
            output: None,
            verbose: false,
            quiet: false,
        }
    }

    fn mark(absent: &[&str], late: &[&str]) -> Command {
        Command::Mark {
            class: "ClassA".to_string(),
            date: None,
            fill: FillMode::Default,
            present: vec![],
            absent: absent.iter().map(|s| s.to_string()).collect(),
            late: late.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::Classes);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_duplicate_student() {
        let args = make_args(mark(&["Bob"], &["Bob"]));
        assert!(args.validate().is_err());

        let args = make_args(mark(&["Bob"], &["Carol"]));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::Classes);
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config_verbose() {
        let mut args = make_args(Command::Classes);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_format_flag() {
        let args = Args::try_parse_from(["attendbook", "classes", "--format", "json"]).unwrap();
        assert_eq!(args.format, Some(FormatArg::Json));
        assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
        assert_eq!(OutputFormat::from(FormatArg::Markdown), OutputFormat::Markdown);

        assert!(Args::try_parse_from(["attendbook", "classes", "--format", "html"]).is_err());
    }

    #[test]
    fn test_parse_mark_command() {
        let args = Args::try_parse_from([
            "attendbook",
            "mark",
            "--class",
            "ClassA",
            "--date",
            "2024-03-01",
            "--fill",
            "absent",
            "--present",
            "Alice,Bob",
        ])
        .unwrap();

        match args.command {
            Command::Mark {
                class,
                date,
                fill,
                present,
                ..
            } => {
                assert_eq!(class, "ClassA");
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert_eq!(fill, FillMode::Absent);
                assert_eq!(present, vec!["Alice", "Bob"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_month_out_of_range_is_rejected() {
        let result = Args::try_parse_from(["attendbook", "monthly", "--month", "13"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_overrides() {
        let overrides = status_overrides(&["Alice".to_string()], &[" Bob ".to_string()], &[]);
        assert_eq!(
            overrides,
            vec![
                ("Alice".to_string(), AttendanceStatus::Present),
                ("Bob".to_string(), AttendanceStatus::Absent),
            ]
        );
        assert_eq!(BulkFill::from(FillMode::Absent), BulkFill::AllAbsent);
    }
}
