//! Slack-Archiver main entry point
//!
//! This is the command-line interface for the resumable Slack workspace exporter.

use anyhow::Context;
use clap::Parser;
use slack_archiver::client::{ApiCaller, SlackHttpClient};
use slack_archiver::config::{load_or_default, read_token, Config};
use slack_archiver::crawler::{run_export, ExportOptions};
use slack_archiver::output::print_statistics;
use slack_archiver::store::ObjectStore;
use slack_archiver::ExportSession;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Slack-Archiver: a resumable Slack workspace exporter
///
/// Exports emoji, channels, users, conversation members, message histories with
/// thread replies, and shared files into a dated archive directory. Interrupted
/// exports can be rerun; finished conversations are never fetched twice.
#[derive(Parser, Debug)]
#[command(name = "slack-archiver")]
#[command(version)]
#[command(about = "A resumable Slack workspace exporter", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Export curated channels and private conversations
    #[arg(long, conflicts_with = "only_emojis")]
    all: bool,

    /// Export the channels listed in the curated channel file
    #[arg(long, conflicts_with = "only_emojis")]
    export_channels: bool,

    /// Export direct and group messages
    #[arg(long, conflicts_with = "only_emojis")]
    export_private: bool,

    /// Export custom emoji only
    #[arg(long)]
    only_emojis: bool,

    /// Validate config and show what would be exported without calling the API
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            channels: self.all || self.export_channels,
            private: self.all || self.export_private,
            only_emojis: self.only_emojis,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let today = chrono::Local::now().date_naive();
    let options = cli.export_options();

    if cli.dry_run {
        handle_dry_run(&config, options, today);
        return Ok(());
    }

    handle_export(&config, options, today).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("slack_archiver=info,warn"),
            1 => EnvFilter::new("slack_archiver=debug,info"),
            2 => EnvFilter::new("slack_archiver=trace,debug"),
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

/// Handles the --dry-run mode: shows configuration and the planned phases
fn handle_dry_run(config: &Config, options: ExportOptions, today: chrono::NaiveDate) {
    println!("=== Slack-Archiver Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Token variable: {}", config.api.token_env);
    println!(
        "  Token present: {}",
        if read_token(config).is_ok() { "yes" } else { "no" }
    );
    println!("  Timeout: {}s", config.api.timeout_secs);

    println!("\nRate Limit:");
    println!(
        "  At most {} calls per {}s",
        config.rate_limit.window_size, config.rate_limit.interval_secs
    );
    println!("  Safety margin: {}s", config.rate_limit.margin_secs);
    println!("  Max sleep: {}s", config.rate_limit.max_sleep_secs);
    println!("  Retry delay: {}s", config.rate_limit.retry_delay_secs);

    println!("\nOutput:");
    println!(
        "  Archive: {}",
        config
            .output
            .archive_root
            .join(slack_archiver::store::dated_directory_name(today))
            .display()
    );
    println!("  Channel list: {}", config.output.channels_file.display());
    println!("  Channel template: {}", config.output.template_file.display());

    println!("\nPhases:");
    println!("  - emoji");
    if !options.only_emojis {
        println!("  - channels, users and derived maps");
        println!("  - conversation members");
        println!("  - channel template");
        if options.channels {
            println!("  - curated channel messages");
        }
        if options.private {
            println!("  - private messages");
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main export operation
async fn handle_export(
    config: &Config,
    options: ExportOptions,
    today: chrono::NaiveDate,
) -> anyhow::Result<()> {
    let token = read_token(config)?;

    let api = SlackHttpClient::new(&config.api, token).context("Failed to build HTTP client")?;
    let caller = ApiCaller::from_config(Arc::new(api), &config.rate_limit);

    let store = ObjectStore::open_dated(&config.output.archive_root, today)?;
    tracing::info!("Exporting into {}", store.base_dir().display());

    let mut session = ExportSession::new(caller, store);

    // Run the export
    let result = run_export(&mut session, &config.output, options).await;
    print_statistics(session.stats(), &session.call_stats());

    match result {
        Ok(()) if session.stats().has_problems() => {
            tracing::warn!("Export completed; some items were left out, see the statistics above");
            Ok(())
        }
        Ok(()) => {
            tracing::info!("Export completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            Err(e.into())
        }
    }
}
