//! Listing watch CLI
//!
//! Runs the sweep loop, a single sweep, or one-off source crawls.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use listing_watch::{
    adapters::AdapterRegistry,
    error::Result,
    models::{Config, SourceCatalog},
    notify::{Channel, Dispatcher, LogChannel, TelegramChannel},
    pipeline::{Orchestrator, Scheduler},
};

/// Listing watch - real-estate listing notifier
#[derive(Parser, Debug)]
#[command(
    name = "listing-watch",
    version,
    about = "Announces new real-estate listings on Telegram"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep all sources forever
    Run {
        /// Minutes between sweeps (overrides scheduler.interval_minutes)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Sweep all sources once, then exit
    Sweep {
        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Crawl one source and print what it lists
    Scrape {
        /// Source name as configured
        source: String,
    },

    /// Validate the configuration and bind every source
    Validate,

    /// List built-in adapters
    Sources,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load, override and validate the configuration.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env();
    if let Command::Run {
        interval: Some(minutes),
        ..
    } = &cli.command
    {
        config.scheduler.interval_minutes = *minutes;
    }
    config.validate()?;
    Ok(config)
}

fn orchestrator(config: &Config, registry: &AdapterRegistry) -> Result<Orchestrator> {
    let catalog = SourceCatalog::bind_all(&config.sources, registry)?;
    log::info!("Sources: {}", catalog.names().join(", "));
    Orchestrator::new(config.crawler.clone(), catalog)
}

async fn start<C: Channel>(
    orchestrator: Orchestrator,
    channel: C,
    config: &Config,
    forever: bool,
) {
    let interval = config.scheduler.interval();
    let mut scheduler = Scheduler::new(
        orchestrator,
        Dispatcher::new(channel, &config.notifier),
        interval,
    );
    if forever {
        scheduler.run().await;
    } else {
        scheduler.sweep().await;
    }
}

async fn watch(config: &Config, registry: &AdapterRegistry, dry_run: bool, forever: bool) -> Result<()> {
    let orchestrator = orchestrator(config, registry)?;
    if dry_run {
        log::info!("Dry run: messages are logged, not sent");
        start(orchestrator, LogChannel, config, forever).await;
    } else {
        let channel = TelegramChannel::connect(&config.notifier).await?;
        start(orchestrator, channel, config, forever).await;
    }
    Ok(())
}

async fn execute(cli: &Cli) -> Result<()> {
    let registry = AdapterRegistry::builtin()?;

    if matches!(cli.command, Command::Sources) {
        for key in registry.keys() {
            let title = registry
                .get(key)
                .and_then(|adapter| adapter.title().map(str::to_string))
                .unwrap_or_default();
            println!("{key:<28}{title}");
        }
        return Ok(());
    }

    let config = load_config(cli)?;

    match &cli.command {
        Command::Run { dry_run, .. } => watch(&config, &registry, *dry_run, true).await?,

        Command::Sweep { dry_run } => watch(&config, &registry, *dry_run, false).await?,

        Command::Scrape { source } => {
            let orchestrator = orchestrator(&config, &registry)?;
            let announcements = orchestrator.scrape(source).await?;
            log::info!("{}: {} listing(s)", source, announcements.len());
            println!("{}", serde_json::to_string_pretty(&announcements)?);
        }

        Command::Validate => {
            let catalog = SourceCatalog::bind_all(&config.sources, &registry)?;
            log::info!("✓ Config OK, {} source(s) bound", catalog.len());
            for source in catalog.iter() {
                log::info!("  {} ({}): {}", source.name, source.title, source.index_url);
            }
            if config.notifier.bot_token.is_empty() {
                log::warn!("No bot token configured; only --dry-run will work");
            }
        }

        Command::Sources => {}
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = execute(&cli).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
