//! Hotlist main entry point
//!
//! This is the command-line interface for the Hotlist harvester.

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use hotlist::config::{load_config_with_hash, Config};
use hotlist::crawler::{CrawlCycle, HttpRenderer, Scheduler};
use hotlist::storage::{ConfigDefaults, DateRange, ItemQuery, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Hotlist: a scheduled harvester for authenticated trending lists
///
/// Hotlist renders a trending-list page with a session you supply, extracts
/// the ranked items and stores each item once, keeping history across runs.
#[derive(Parser, Debug)]
#[command(name = "hotlist")]
#[command(version)]
#[command(about = "A scheduled harvester for authenticated trending lists", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one cycle now, then keep harvesting at the configured interval
    Run,

    /// Run a single crawl cycle and print its outcome
    Crawl,

    /// Inspect or change runtime configuration stored in the database
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List stored items, newest first
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Items per page
        #[arg(long, default_value_t = 20)]
        limit: u32,

        /// Earliest creation time (RFC 3339 or YYYY-MM-DD), inclusive
        #[arg(long, value_parser = parse_date_bound)]
        start: Option<DateTime<Utc>>,

        /// Latest creation time (RFC 3339 or YYYY-MM-DD, end of day), inclusive
        #[arg(long, value_parser = parse_end_bound)]
        end: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show every key with its value and description
    List,

    /// Print the value of one key
    Get { key: String },

    /// Update an existing key
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let storage = open_storage(&config)?;

    match cli.command {
        Command::Run => handle_run(&config, storage).await,
        Command::Crawl => handle_crawl(&config, storage).await,
        Command::Config { action } => handle_config(action, storage),
        Command::List {
            page,
            limit,
            start,
            end,
        } => handle_list(
            storage,
            ItemQuery {
                page,
                limit,
                range: DateRange { start, end },
            },
        ),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hotlist=info,warn"),
            1 => EnvFilter::new("hotlist=debug,info"),
            2 => EnvFilter::new("hotlist=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    SqliteStorage::new(path, &ConfigDefaults::from(&config.crawler))
        .with_context(|| format!("Failed to open database {}", path.display()))
}

fn build_cycle(config: &Config, storage: SqliteStorage) -> anyhow::Result<Arc<CrawlCycle>> {
    let renderer = HttpRenderer::with_user_agent(&config.crawler.user_agent)
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(CrawlCycle::from_config(
        config,
        Arc::new(Mutex::new(storage)),
        Arc::new(renderer),
    )))
}

/// Handles the recurring mode until Ctrl-C
async fn handle_run(config: &Config, storage: SqliteStorage) -> anyhow::Result<()> {
    let cycle = build_cycle(config, storage)?;
    let scheduler = Scheduler::new(
        cycle,
        Duration::from_millis(config.crawler.default_fetch_interval),
    );

    tracing::info!("Harvesting {}", config.target.url);
    let handle = scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!(
        "Shutting down after {} completed cycles",
        handle.cycles_completed()
    );
    handle.shutdown().await?;

    Ok(())
}

/// Handles a manual single cycle
async fn handle_crawl(config: &Config, storage: SqliteStorage) -> anyhow::Result<()> {
    let cycle = build_cycle(config, storage)?;
    let outcome = cycle.run().await;

    println!("{}", outcome);

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn handle_config(action: ConfigAction, mut storage: SqliteStorage) -> anyhow::Result<()> {
    match action {
        ConfigAction::List => {
            for entry in storage.list_configs()? {
                println!("{} = {:?}", entry.key, entry.value);
                println!("    {}", entry.description);
            }
        }
        ConfigAction::Get { key } => match storage.get_config(&key)? {
            Some(value) => println!("{}", value),
            None => bail!("Unknown config key: {}", key),
        },
        ConfigAction::Set { key, value } => {
            if storage.update_config(&key, &value)? == 0 {
                bail!("Unknown config key: {}", key);
            }
            println!("✓ Updated {}", key);
        }
    }
    Ok(())
}

fn handle_list(storage: SqliteStorage, query: ItemQuery) -> anyhow::Result<()> {
    let items = storage.list_items(&query)?;
    let total = storage.count_items(&query.range)?;

    println!(
        "Page {} ({} per page), {} items total\n",
        query.page.max(1),
        query.limit,
        total
    );
    for item in items {
        println!("#{:<3} {}  [{}]", item.rank, item.title, item.heat);
        println!("     {}  ({})", item.url, item.created_at);
    }

    Ok(())
}

fn parse_date_bound(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_date(raw, false)
}

fn parse_end_bound(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_date(raw, true)
}

/// Accepts RFC 3339 timestamps or plain dates; a plain end date covers the whole day
fn parse_date(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("expected RFC 3339 or YYYY-MM-DD, got '{}': {}", raw, e))?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| format!("invalid date '{}'", raw))
}
