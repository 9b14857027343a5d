use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio::sync::Notify;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use newsreel::infrastructure::{
    AppConfig, CliArgs, DiskStore, FetchCoordinator, HttpImageFetcher, StorageManager,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config() -> Result<(AppConfig, Vec<String>)> {
    let args = CliArgs::parse();
    let urls = args.urls.clone();

    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);

    Ok((config, urls))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (config, urls) = load_config()?;
    init_logging(&config)?;

    info!(version = newsreel::VERSION, "Starting newsreel");

    let disk = match &config.images.cache_dir {
        Some(dir) => DiskStore::open(dir.clone()).await?,
        None => DiskStore::default_location().await?,
    };
    let fetcher = Arc::new(HttpImageFetcher::new(&config.images)?);

    let done = Arc::new(Notify::new());
    let listener = {
        let done = done.clone();
        move || done.notify_one()
    };

    let coordinator =
        FetchCoordinator::initialize(&config.images, disk, fetcher, Arc::new(listener)).await;

    for url in &urls {
        coordinator.ensure_cached(url);
    }
    let queued = coordinator.pending_count();
    let batch = coordinator.batch_download();

    done.notified().await;
    let summary = batch.join().await.unwrap_or_default();

    for url in &urls {
        match coordinator.lookup(url) {
            Some(img) => println!("ready    {:>5}x{:<5} {url}", img.width(), img.height()),
            None => println!("missing              {url}"),
        }
    }

    println!(
        "{queued} queued, {} downloaded, {} failed ({})",
        summary.cached,
        summary.failed,
        coordinator.disk().cache_dir().display()
    );
    info!(stats = %coordinator.index().stats(), "Done");

    Ok(())
}
