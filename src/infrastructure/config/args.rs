use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "newsreel",
    version,
    about = "Fetch article pictures into the local thumbnail cache",
    long_about = None
)]
pub struct CliArgs {
    /// Picture URLs to cache.
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Picture cache directory.
    #[arg(long, value_name = "PATH", env = "NEWSREEL_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum downloads running at once.
    #[arg(long)]
    pub max_concurrent_downloads: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}
