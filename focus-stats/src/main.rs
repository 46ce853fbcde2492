//! focus-stats - focus session statistics from the command line
//!
//! Reads timer records from a JSON file, prints day/week/month/year rollups
//! and keeps a rebuildable rollup cache in SQLite.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use focus_stats_core::analytics::{
    build_cache_data, compute_comparison, compute_month_stats, compute_overall_stats,
    compute_week_stats, compute_year_stats,
};
use focus_stats_core::logging;
use focus_stats_core::{
    CacheError, CacheStore, ComparisonData, Config, DayStats, MonthStats, OverallStats, Record,
    Refresh, Session, SqliteStore, WeekStats, WriteOutcome, YearMonth, YearStats,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "focus-stats")]
#[command(about = "Focus session statistics with a local rollup cache")]
#[command(version)]
struct Args {
    /// Records file (JSON array); defaults to records.json in the data directory
    #[arg(long, global = true)]
    records: Option<PathBuf>,

    /// Sessions file (JSON array), used as auxiliary metadata
    #[arg(long, global = true)]
    sessions: Option<PathBuf>,

    /// Day to anchor streaks and comparisons on (default: today, UTC)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Totals and streaks across the whole history
    Overall,
    /// Rollup of one calendar month
    Month {
        /// Month as YYYY-MM
        year_month: YearMonth,
    },
    /// Seven days starting at the given date
    Week {
        /// First day as YYYY-MM-DD
        start: NaiveDate,
    },
    /// Rollup of one calendar year
    Year { year: i32 },
    /// This month and week against the previous ones
    Compare,
    /// Rebuild the cache if it is missing or stale
    Refresh {
        /// When the records last changed (RFC 3339); defaults to the records file mtime
        #[arg(long)]
        mutated_at: Option<DateTime<Utc>>,
    },
    /// Inspect or manage the cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show cache diagnostics
    Info,
    /// Write the cached snapshot as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace the cache with a previously exported snapshot
    Import { file: PathBuf },
    /// Remove the cache
    Clear,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = logging::init(&config.logging).ok();

    let now = Utc::now();
    let today = args.today.unwrap_or_else(|| now.date_naive());

    match &args.command {
        Command::Overall => {
            let (sessions, records) = load_inputs(&args)?;
            let stats = compute_overall_stats(&sessions, &records, today);
            emit(&args, &stats, print_overall)?;
        }
        Command::Month { year_month } => {
            let records = load_records(&records_path(&args))?;
            let stats = compute_month_stats(&records, *year_month);
            emit(&args, &stats, print_month)?;
        }
        Command::Week { start } => {
            let records = load_records(&records_path(&args))?;
            let stats = compute_week_stats(&records, *start);
            emit(&args, &stats, print_week)?;
        }
        Command::Year { year } => {
            let records = load_records(&records_path(&args))?;
            let stats = compute_year_stats(&records, *year);
            emit(&args, &stats, print_year)?;
        }
        Command::Compare => {
            let records = load_records(&records_path(&args))?;
            let stats = compute_comparison(&records, today);
            emit(&args, &stats, print_comparison)?;
        }
        Command::Refresh { mutated_at } => {
            let cache = open_cache(&config)?;
            let path = records_path(&args);
            let last_mutation = match mutated_at {
                Some(at) => Some(*at),
                None => file_mtime(&path)?,
            };
            let (sessions, records) = load_inputs(&args)?;

            let refresh = cache.get_or_rebuild(last_mutation, now, || {
                build_cache_data(&sessions, &records, today, now, config.cache.ttl_ms)
            });
            report_refresh(&args, &refresh)?;
        }
        Command::Cache { action } => {
            let cache = open_cache(&config)?;
            run_cache_action(&args, &cache, action)?;
        }
    }

    Ok(())
}

// ============================================
// Inputs
// ============================================

fn records_path(args: &Args) -> PathBuf {
    args.records
        .clone()
        .unwrap_or_else(|| Config::data_dir().join("records.json"))
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records file {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse records file {}", path.display()))?;
    tracing::info!(count = records.len(), path = %path.display(), "Loaded records");
    Ok(records)
}

fn load_sessions(path: &Path) -> Result<Vec<Session>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sessions file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse sessions file {}", path.display()))
}

fn load_inputs(args: &Args) -> Result<(Vec<Session>, Vec<Record>)> {
    let sessions = match &args.sessions {
        Some(path) => load_sessions(path)?,
        None => Vec::new(),
    };
    let records = load_records(&records_path(args))?;
    Ok((sessions, records))
}

fn file_mtime(path: &Path) -> Result<Option<DateTime<Utc>>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to stat records file {}", path.display()))?;
    Ok(metadata.modified().ok().map(DateTime::<Utc>::from))
}

fn open_cache(config: &Config) -> Result<CacheStore<SqliteStore>> {
    let db_path = Config::cache_db_path();
    let mut store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open cache database {}", db_path.display()))?;
    store.migrate().context("failed to migrate cache database")?;
    if let Some(max_bytes) = config.cache.max_bytes {
        store = store.with_max_bytes(max_bytes);
    }
    Ok(CacheStore::from_config(store, &config.cache))
}

// ============================================
// Cache commands
// ============================================

fn run_cache_action(
    args: &Args,
    cache: &CacheStore<SqliteStore>,
    action: &CacheAction,
) -> Result<()> {
    match action {
        CacheAction::Info => {
            let info = cache.info().context("failed to read cache")?;
            if args.json {
                print_json(&info)?;
            } else {
                println!("Cache: {}", Config::cache_db_path().display());
                println!("  Exists:      {}", yes_no(info.exists));
                println!("  Size:        {} bytes", info.size);
                match info.last_update {
                    Some(at) => println!("  Last update: {}", at.to_rfc3339()),
                    None => println!("  Last update: never"),
                }
                println!("  TTL:         {}", format_duration(info.ttl / 1000));
                println!("  Stale:       {}", yes_no(info.is_stale));
                println!("Log:   {}", logging::log_file_path().display());
            }
        }
        CacheAction::Export { output } => {
            let snapshot = match cache.export_snapshot() {
                Ok(snapshot) => snapshot,
                Err(CacheError::NoCache) => {
                    anyhow::bail!("no cache data to export; run `focus-stats refresh` first")
                }
                Err(e) => return Err(e).context("failed to export cache"),
            };
            match output {
                Some(path) => {
                    std::fs::write(path, &snapshot)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Exported cache to {}", path.display());
                }
                None => println!("{}", snapshot),
            }
        }
        CacheAction::Import { file } => {
            let blob = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read snapshot {}", file.display()))?;
            let outcome = cache
                .import_snapshot(&blob)
                .with_context(|| format!("failed to import snapshot {}", file.display()))?;
            if warn_write(&outcome) {
                println!("Imported cache from {}", file.display());
            }
        }
        CacheAction::Clear => {
            cache.clear().context("failed to clear cache")?;
            println!("Cache cleared");
        }
    }
    Ok(())
}

fn report_refresh(args: &Args, refresh: &Refresh) -> Result<()> {
    if let Refresh::Rebuilt {
        write, discarded, ..
    } = refresh
    {
        if let Some(reason) = discarded {
            tracing::warn!(%reason, "Discarded malformed cache");
            eprintln!("warning: discarded unusable cache ({})", reason);
        }
        warn_write(write);
    }

    let data = refresh.data();
    if args.json {
        return print_json(data);
    }

    let state = if refresh.was_rebuilt() {
        "rebuilt"
    } else {
        "fresh"
    };
    println!(
        "Cache {}: {} months, {} indexed records",
        state,
        data.monthly_stats.len(),
        data.session_index.len()
    );
    print_overall(&data.overall_stats);
    Ok(())
}

/// Surface a failed write as a warning. Returns true when the write went through.
fn warn_write(outcome: &WriteOutcome) -> bool {
    match outcome {
        WriteOutcome::Written { bytes } => {
            tracing::debug!(bytes, "Cache written");
            true
        }
        WriteOutcome::QuotaExceeded { error, cleared } => {
            tracing::warn!(%error, cleared, "Cache write exceeded quota");
            eprintln!("warning: cache not saved, storage quota exceeded ({})", error);
            false
        }
        WriteOutcome::Failed(error) => {
            tracing::warn!(%error, "Cache write failed");
            eprintln!("warning: cache not saved ({})", error);
            false
        }
    }
}

// ============================================
// Output
// ============================================

fn emit<T: Serialize>(args: &Args, value: &T, print_text: fn(&T)) -> Result<()> {
    if args.json {
        print_json(value)
    } else {
        print_text(value);
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", secs)
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn print_day(day: &DayStats) {
    if day.is_active() {
        println!(
            "  {}  {:>8}  {:>2} sessions  {:>3}%",
            day.date,
            format_duration(day.total_seconds),
            day.completed_sessions,
            day.productivity
        );
    } else {
        println!("  {}  {:>8}", day.date, "-");
    }
}

fn print_overall(stats: &OverallStats) {
    println!("Overall");
    if stats.total_active_days == 0 {
        println!("  No records yet.");
        return;
    }
    println!("  Focus time:      {}", format_duration(stats.total_seconds));
    println!("  Sessions:        {}", stats.total_sessions);
    if let (Some(start), Some(end)) = (stats.start_date, stats.end_date) {
        println!(
            "  Active days:     {} ({} to {})",
            stats.total_active_days, start, end
        );
    }
    println!("  Current streak:  {} days", stats.current_streak);
    println!("  Longest streak:  {} days", stats.longest_streak);
    println!("  Avg per day:     {}", format_duration(stats.avg_daily_seconds));
    println!(
        "  Avg per session: {}",
        format_duration(stats.avg_session_duration)
    );
    if let Some(month) = stats.most_productive_month {
        println!("  Best month:      {}", month);
    }
    println!("  Productivity:    {}%", stats.overall_productivity);
}

fn print_month(stats: &MonthStats) {
    println!("Month {}", stats.year_month);
    println!(
        "  Focus time: {}  Sessions: {}  Active days: {}",
        format_duration(stats.total_seconds),
        stats.total_sessions,
        stats.active_days
    );
    if let Some(best) = stats.most_productive_day {
        println!("  Best day:   {} ({}%)", best, stats.max_productivity);
    }
    println!();
    for day in &stats.days {
        print_day(day);
    }
}

fn print_week(stats: &WeekStats) {
    println!(
        "Week {} ({} to {})",
        stats.year_week, stats.start_date, stats.end_date
    );
    println!(
        "  Focus time: {}  Sessions: {}  Active days: {}  Avg per day: {}",
        format_duration(stats.total_seconds),
        stats.total_sessions,
        stats.active_days,
        format_duration(stats.avg_daily_seconds)
    );
    println!();
    for day in &stats.days {
        print_day(day);
    }
}

fn print_year(stats: &YearStats) {
    println!("Year {}", stats.year);
    println!(
        "  Focus time: {}  Sessions: {}  Active days: {}  Productivity: {}%",
        format_duration(stats.total_seconds),
        stats.total_sessions,
        stats.total_active_days,
        stats.avg_productivity
    );
    println!();
    for month in &stats.months {
        println!(
            "  {}  {:>8}  {:>3} sessions  {:>2} days",
            month.year_month,
            format_duration(month.total_seconds),
            month.total_sessions,
            month.active_days
        );
    }
}

fn total_seconds(days: &[DayStats]) -> u64 {
    days.iter()
        .map(|d| d.total_seconds)
        .fold(0, u64::saturating_add)
}

fn print_comparison(stats: &ComparisonData) {
    let this_week = &stats.week_comparison.this_week;
    let last_week = &stats.week_comparison.last_week;

    println!("Comparison");
    println!(
        "  This month: {:>8}  Last month: {:>8}  Change: {:+.1}%",
        format_duration(total_seconds(&stats.this_month)),
        format_duration(total_seconds(&stats.last_month)),
        stats.growth_rate
    );
    println!(
        "  This week:  {:>8}  Last week:  {:>8}",
        format_duration(this_week.total_seconds),
        format_duration(last_week.total_seconds)
    );
}
