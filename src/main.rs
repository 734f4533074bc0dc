//! ga4compare - Universal Analytics vs GA4 performance comparison
//!
//! A CLI tool that reads a precomputed UA/GA4 comparison table, applies
//! date/source/medium/campaign filters and renders per-date series of
//! users, sessions and transactions.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable table, bad config, write failure, etc.)
//!   2 - Filters matched no rows and --fail-on-empty was set

mod analysis;
mod cli;
mod config;
mod dashboard;
mod data;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use data::LoadOptions;
use models::{Dimension, Table};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging starts so it can raise the log level
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, config.general.verbose);

    info!("ga4compare v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match origin {
        ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
        ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
        ConfigOrigin::Fallback(reason) => warn!("Failed to load config: {}", reason),
    }

    match run(&args, config) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Render failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ga4compare.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the data file, default filters and metric columns.");
    Ok(())
}

/// Initialize logging based on verbosity settings. Logs go to stderr so
/// reports written to stdout stay clean.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = if config_verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one render pass. Returns the exit code (0 or 2).
fn run(args: &Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    config.validate()?;

    let data_path = PathBuf::from(&config.data.path);
    let load_options = LoadOptions {
        delimiter: config.delimiter_byte(),
        required_metrics: config.metrics.required_columns(),
    };
    let table = data::load_with(&data_path, &load_options)
        .context("Failed to load comparison table")?;

    if args.list_options {
        print_options(&table);
        return Ok(0);
    }

    let selection = config.filters.to_selection();
    info!("Filters: {}", selection);

    let dashboard =
        dashboard::build_dashboard(&table, &selection, &config.metrics, &config.data.path)?;
    let output = report::render(&dashboard, config.general.format)?;

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path))?;

            println!("📊 Comparison Summary:");
            println!(
                "   Rows matched: {} of {}",
                dashboard.metadata.rows_matched, dashboard.metadata.rows_total
            );
            for chart in &dashboard.charts {
                println!("   {}: {} points", chart.title, chart.data.rows.len());
            }
            println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
            println!("\n✅ Report saved to: {}", path);
        }
        None => print!("{}", output),
    }

    if args.fail_on_empty && dashboard.is_empty() {
        eprintln!("\n⛔ No rows match the selected filters. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Handle --list-options: print the selectable values per filter.
fn print_options(table: &Table) {
    for dimension in Dimension::ALL {
        println!("{}:", dimension.column());
        for value in analysis::distinct_values(table, dimension) {
            println!("  {}", value);
        }
    }
}

/// Where the effective configuration came from.
enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    /// The default config file exists but could not be used.
    Fallback(String),
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::File(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Defaults)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(format!("{:#}", e)))),
    }
}
