//! Attendbook - class attendance ledger.
//!
//! A CLI over the attendbook library: records daily attendance per class and
//! prints daily, per-student, monthly and year-end reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (bad arguments, unknown class or student, unreadable or unsaved data)

mod cli;
mod config;

use anyhow::{Context, Result};
use attendbook::report::{
    day_summary, render, ClassListing, OutputFormat, Reports, ToMarkdown,
};
use attendbook::{AttendanceError, JsonStore, Ledger};
use chrono::{Datelike, Local, NaiveDate};
use cli::{Args, Command};
use config::{Config, DEFAULT_CONFIG_FILE};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // Load configuration first so `[general] verbose` can pick the log level
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("Attendbook v{}", env!("CARGO_PKG_VERSION"));
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file loaded, using defaults"),
    }
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config) {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .attendbook.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to change document paths, output format or award rules.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so reports on stdout can be piped.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr. Returns
/// the path the config came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(DEFAULT_CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}

/// Run one command against the ledger.
fn run(args: Args, config: Config) -> Result<()> {
    let store = JsonStore::new(
        config.storage.roster_path.clone(),
        config.storage.attendance_path.clone(),
    );
    let (mut ledger, warnings) = Ledger::open(store)?;
    for warning in &warnings {
        eprintln!("⚠️  {}", warning);
    }

    let format = config.general.format;
    let today = Local::now().date_naive();

    let output = match args.command.clone() {
        Command::Classes => emit(&ClassListing::from_ledger(&ledger), format)?,
        Command::Mark {
            class,
            date,
            fill,
            present,
            absent,
            late,
        } => {
            let date = date.unwrap_or(today);
            let overrides = cli::status_overrides(&present, &absent, &late);
            let statuses = ledger.fill_statuses(&class, fill.into(), &overrides)?;

            handle_mark(&mut ledger, &class, date, statuses)?
        }
        Command::Daily { date } => {
            let date = date
                .or_else(|| ledger.all_dates().into_iter().next_back())
                .unwrap_or(today);
            emit(&Reports::new(&ledger).daily_report(date), format)?
        }
        Command::Student { class, student } => {
            emit(&Reports::new(&ledger).student_report(&class, &student)?, format)?
        }
        Command::Monthly { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            emit(
                &Reports::new(&ledger).monthly_class_summary(year, month),
                format,
            )?
        }
        Command::Analytics { class, year } => {
            let year = year.unwrap_or(today.year());
            emit(&Reports::new(&ledger).monthly_analytics(&class, year)?, format)?
        }
        Command::Progress {
            class,
            student,
            year,
        } => {
            let year = year.unwrap_or(today.year());
            let progress =
                Reports::new(&ledger).student_progress(&class, &student, year, today)?;
            emit(&progress, format)?
        }
        Command::Awards { year, .. } => {
            let year = year.unwrap_or(today.year());
            let awards = Reports::new(&ledger)
                .with_min_days(config.awards.min_days)
                .year_end_awards(year);
            emit(&awards, format)?
        }
        Command::InitConfig => return handle_init_config(),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("✅ Report saved to: {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}

fn emit<T: ToMarkdown + Serialize>(report: &T, format: OutputFormat) -> Result<String> {
    Ok(render(report, format)?)
}

/// Record a day and describe the result.
///
/// A failed save leaves the record applied in memory only; the error says so.
fn handle_mark(
    ledger: &mut Ledger,
    class: &str,
    date: NaiveDate,
    statuses: std::collections::BTreeMap<String, attendbook::models::AttendanceStatus>,
) -> Result<String> {
    match ledger.record_day(class, date, statuses) {
        Ok(()) => {}
        Err(e @ AttendanceError::Save { .. }) => {
            return Err(e).context(format!(
                "Attendance for {} on {} was applied but NOT saved",
                class, date
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let mut output = format!("✅ Attendance saved for {} on {}!\n", class, date);
    if let Some(tally) = day_summary(ledger, class, date) {
        output.push_str(&format!(
            "   Summary: Present: {} | Absent: {} | Late: {}\n",
            tally.present, tally.absent, tally.late
        ));
    }

    Ok(output)
}
