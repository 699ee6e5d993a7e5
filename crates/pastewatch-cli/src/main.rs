use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pastewatch_client::{HealthchecksClient, PastebinClient};
use pastewatch_core::traits::PasteStore;
use pastewatch_core::{DedupCache, Supervisor, SupervisorConfig, TracingSupervisorReporter};
use pastewatch_db::{
    AnyStore, Database, DatabaseConfig, FileStore, FileStoreConfig, MongoConfig, MongoPasteStore,
};

#[derive(Parser)]
#[command(
    name = "pastewatch",
    version,
    about = "Archive newly published Pastebin pastes"
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape on a fixed interval until interrupted (default)
    Run,

    /// Run a single scrape cycle and exit
    Once,
}

#[derive(Args)]
struct Settings {
    /// Storage backend for scraped pastes
    #[arg(long, env = "STORAGE_TYPE", value_enum)]
    storage: StorageKind,

    /// Healthchecks ping URL
    #[arg(long, env = "HEALTHCHECK")]
    healthcheck: String,

    /// Maximum pastes fetched at once
    #[arg(long, env = "SCRAPER_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Seconds between scrape cycles
    #[arg(long, env = "SCRAPE_INTERVAL_SECS", default_value_t = 180)]
    interval_secs: u64,

    /// Seconds to back off after the provider throttles us
    #[arg(long, env = "THROTTLE_COOLDOWN_SECS", default_value_t = 120)]
    cooldown_secs: u64,

    /// Number of recently saved keys remembered in memory
    #[arg(long, env = "DEDUP_CACHE_CAPACITY", default_value_t = 250)]
    cache_capacity: usize,

    /// Per-request timeout for the paste feed, in seconds
    #[arg(long, env = "FEED_TIMEOUT_SECS", default_value_t = 10)]
    feed_timeout_secs: u64,

    /// Pastes requested per listing (max 250)
    #[arg(long, env = "PASTEBIN_LIST_LIMIT", default_value_t = 250)]
    list_limit: u32,

    /// Scraping API base URL
    #[arg(
        long,
        env = "PASTEBIN_BASE_URL",
        default_value = "https://scrape.pastebin.com"
    )]
    feed_url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum StorageKind {
    Postgres,
    Mongo,
    /// JSON files in a local directory
    File,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pastewatch=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    let store = open_store(settings.storage, settings.cache_capacity).await?;
    store
        .initialize()
        .await
        .with_context(|| format!("Failed to initialize {} store", store.backend()))?;

    let feed = PastebinClient::with_base_url(&settings.feed_url)?
        .with_timeout(Duration::from_secs(settings.feed_timeout_secs))?
        .with_list_limit(settings.list_limit);
    let health = HealthchecksClient::new(&settings.healthcheck)?;

    let config = SupervisorConfig::default()
        .with_interval(Duration::from_secs(settings.interval_secs))
        .with_cooldown(Duration::from_secs(settings.cooldown_secs))
        .with_concurrency(settings.concurrency);
    let supervisor = Supervisor::new(feed, store, health, config);
    let reporter = TracingSupervisorReporter;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let cancel = CancellationToken::new();
            spawn_shutdown_listener(cancel.clone());
            supervisor.run(cancel, &reporter).await?;
        }
        Commands::Once => {
            let summary = supervisor.run_once(&reporter).await?;
            println!(
                "listed {} pastes, saved {}, skipped {}",
                summary.listed, summary.saved, summary.skipped
            );
        }
    }

    Ok(())
}

/// Build the configured store. Connections are deferred to `initialize`.
async fn open_store(kind: StorageKind, cache_capacity: usize) -> Result<AnyStore> {
    let cache = DedupCache::new(cache_capacity);
    let store = match kind {
        StorageKind::Postgres => {
            let config = DatabaseConfig::from_env()?;
            Database::connect_lazy(&config)?.paste_store(cache).into()
        }
        StorageKind::Mongo => {
            let config = MongoConfig::from_env()?;
            MongoPasteStore::connect(&config, cache).await?.into()
        }
        StorageKind::File => {
            let config = FileStoreConfig::from_env();
            FileStore::with_cache(config.dir, cache).into()
        }
    };
    Ok(store)
}

fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            cancel.cancel();
        }
    });
}
