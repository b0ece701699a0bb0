//! bodylog - weight and waist tracker
//!
//! A CLI tool that records daily weight and waist measurements, reports
//! weekly statistics compared with earlier weeks, and keeps JSON backups.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid input, unreadable data file, bad backup, etc.)

mod analysis;
mod backup;
mod calendar;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod store;

use analysis::ComparisonEngine;
use anyhow::{Context, Result};
use backup::{AutoBackup, AutoBackupOutcome};
use cli::{Args, Command, OutputFormat};
use config::Config;
use models::{ComparisonPeriod, MetricKind, NewMeasurement};
use std::path::{Path, PathBuf};
use store::{EntryRepository, JsonFileStore, MemoryStore, SaveOutcome};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, config_warning) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    debug!("bodylog v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    if let Some(warning) = config_warning {
        warn!("{}", warning);
    }

    if let Err(e) = run(args, config).await {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .bodylog.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("Created {} with default settings.", config::CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Open the store and dispatch the command.
async fn run(args: Args, config: Config) -> Result<()> {
    let store = JsonFileStore::new(&config.general.data_file);
    debug!("Using data file {}", store.path().display());

    let auto_backup = AutoBackup::from_config(&config.backup);

    // The explicit backup command runs the task itself.
    if !matches!(args.command, Command::Backup { .. }) {
        run_auto_backup(&auto_backup, &store).await;
    }

    let default_period = config.stats.comparison_period;

    match args.command {
        Command::Stats {
            week,
            period,
            format,
            output,
        } => {
            let week = resolve_date(week.as_deref())?;
            let period = period.unwrap_or(default_period);
            handle_stats(store, week, period, format, output.as_deref()).await?;
        }
        Command::Trend {
            weeks,
            week,
            period,
        } => {
            let week = resolve_date(week.as_deref())?;
            let weeks = weeks
                .unwrap_or(config.stats.trend_weeks)
                .clamp(1, cli::MAX_TREND_WEEKS);
            let engine = ComparisonEngine::new(store);
            let stats = engine
                .week_range_stats(week, weeks, period.unwrap_or(default_period))
                .await?;
            print!(
                "{}",
                report::generate_trend_table(&stats, calendar::today())
            );
        }
        Command::Log {
            kind,
            value,
            date,
            notes,
        } => {
            let date = resolve_date(date.as_deref())?;
            let measurement = NewMeasurement::new(date, value, notes)?;
            handle_log(&store, kind, measurement).await?;
        }
        Command::Edit {
            kind,
            id,
            value,
            notes,
        } => {
            store.update(kind, &id, value, notes).await?;
            info!("Updated {} entry {}", kind, id);
            println!("Updated {} entry {}.", kind, id);
        }
        Command::Delete { kind, id } => {
            store.delete(kind, &id).await?;
            info!("Deleted {} entry {}", kind, id);
            println!("Deleted {} entry {}.", kind, id);
        }
        Command::History { kind, limit } => {
            let listing = match kind {
                MetricKind::Weight => {
                    report::generate_history(kind, &store.fetch_weight().await?, limit)
                }
                MetricKind::Waist => {
                    report::generate_history(kind, &store.fetch_waist().await?, limit)
                }
            };
            print!("{}", listing);
        }
        Command::Export { output } => {
            let path =
                output.unwrap_or_else(|| PathBuf::from(backup::backup_file_name(calendar::today())));
            let json = backup::export(&store).await?.to_json()?;
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write backup to {}", path.display()))?;
            println!("Backup saved to {}.", path.display());
        }
        Command::Import { file, dry_run } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            if dry_run {
                // Restore into a scratch store so nothing on disk changes.
                let scratch = MemoryStore::new();
                let summary = backup::import(&scratch, &text).await?;
                println!(
                    "{} is valid: {} weight and {} waist entries. Nothing was imported.",
                    file.display(),
                    summary.weight_entries,
                    summary.waist_entries
                );
            } else {
                let summary = backup::import(&store, &text).await?;
                println!(
                    "Imported {} weight and {} waist entries from {}.",
                    summary.weight_entries,
                    summary.waist_entries,
                    file.display()
                );
            }
        }
        Command::Backup { force } => {
            let today = calendar::today();
            let outcome = if force {
                auto_backup.run_now(&store, today).await?
            } else {
                auto_backup.run_if_due(&store, today).await?
            };
            match outcome {
                AutoBackupOutcome::Written(path) => {
                    println!("Backup saved to {}.", path.display())
                }
                AutoBackupOutcome::AlreadyRan(date) => println!(
                    "A backup was already taken on {}. Use --force to write another.",
                    calendar::to_date_string(date)
                ),
                AutoBackupOutcome::Disabled => {
                    println!("Auto-backup is disabled. Use --force to write a backup anyway.")
                }
            }
        }
        Command::InitConfig => handle_init_config()?,
    }

    Ok(())
}

async fn handle_stats(
    store: JsonFileStore,
    week: chrono::NaiveDate,
    period: ComparisonPeriod,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let engine = ComparisonEngine::new(store);
    let stats = engine.weekly_stats(week, period).await?;

    let rendered = match format {
        OutputFormat::Json => report::generate_json_report(&stats)?,
        OutputFormat::Markdown => report::generate_markdown_report(&stats),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("Report saved to {}.", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

async fn handle_log(
    store: &JsonFileStore,
    kind: MetricKind,
    measurement: NewMeasurement,
) -> Result<()> {
    let date = calendar::to_date_string(measurement.date);

    match kind {
        MetricKind::Weight => {
            let entry = store.add_weight(measurement).await?;
            println!("Logged weight {:.1} kg on {} ({}).", entry.weight, date, entry.id);
        }
        MetricKind::Waist => {
            let (entry, outcome) = store.save_waist(measurement).await?;
            let verb = match outcome {
                SaveOutcome::Created => "Logged",
                SaveOutcome::Updated => "Updated",
            };
            println!(
                "{} waist {:.1} cm on {} ({}).",
                verb, entry.measurement, date, entry.id
            );
        }
    }

    Ok(())
}

/// Run the daily auto-backup, logging rather than propagating failures.
async fn run_auto_backup<R: EntryRepository>(task: &AutoBackup, store: &R) {
    match task.run_if_due(store, calendar::today()).await {
        Ok(AutoBackupOutcome::Written(path)) => {
            info!("Daily backup written to {}", path.display())
        }
        Ok(_) => {}
        Err(e) => warn!(
            "Auto-backup to {} failed: {}",
            task.directory().display(),
            e
        ),
    }
}

/// Parse an optional date argument, defaulting to today.
fn resolve_date(date: Option<&str>) -> Result<chrono::NaiveDate> {
    match date {
        Some(s) => Ok(calendar::parse_date_string(s)?),
        None => Ok(calendar::today()),
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is installed, so a broken default config file is
/// returned as a warning for the caller to log.
fn load_config(args: &Args) -> Result<(Config, Option<String>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, None));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, None)),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => Ok((
            Config::default(),
            Some(format!("Failed to load config: {:#}", e)),
        )),
    }
}
