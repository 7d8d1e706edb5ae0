use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use smartstore_core::{load_app_config, AppConfig, StorefrontRules};
use smartstore_scraper::{ScrapeOptions, Scraper};

#[derive(Debug, Parser)]
#[command(name = "smartstore-cli")]
#[command(about = "Scrape storefront product pages into structured JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Per-attempt HTTP timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Additional fetch attempts after the first failure.
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Base retry delay in milliseconds.
    #[arg(long, global = true)]
    base_delay_ms: Option<u64>,

    /// Cap on extracted gallery images.
    #[arg(long, global = true)]
    max_images: Option<usize>,

    /// Delay between batch items in milliseconds.
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Skip specification-table extraction.
    #[arg(long, global = true)]
    no_specs: bool,

    /// GET the store root first to pick up session cookies.
    #[arg(long, global = true)]
    establish_session: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a single product URL and print the record as JSON.
    Scrape { url: String },
    /// Scrape every URL in a newline-separated file; lines starting with
    /// `#` are skipped.
    Batch { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = load_app_config()?;
    apply_overrides(&mut config, &cli);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let scraper = Scraper::new(
        StorefrontRules::default(),
        ScrapeOptions::from_config(&config),
    )?;

    match cli.command {
        Commands::Scrape { url } => {
            let record = match scraper.scrape_one(&url).await {
                Ok(record) => record,
                Err(err) => {
                    tracing::error!(kind = ?err.kind(), error = %err, "scrape failed");
                    std::process::exit(1);
                }
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Batch { file } => {
            let urls = read_url_file(&file)?;
            anyhow::ensure!(!urls.is_empty(), "no URLs found in {}", file.display());
            tracing::info!(count = urls.len(), file = %file.display(), "starting batch scrape");
            let outcome = scraper.scrape_many(&urls).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(timeout_secs) = cli.timeout_secs {
        config.request_timeout_secs = timeout_secs;
    }
    if let Some(max_retries) = cli.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(base_delay_ms) = cli.base_delay_ms {
        config.base_retry_delay_ms = base_delay_ms;
    }
    if let Some(max_images) = cli.max_images {
        config.max_images = max_images;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.batch_delay_ms = delay_ms;
    }
    if cli.no_specs {
        config.extract_specifications = false;
    }
    if cli.establish_session {
        config.establish_session = true;
    }
}

fn read_url_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("could not read {}: {e}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_file_skips_blanks_and_comments() {
        let dir = std::env::temp_dir();
        let path = dir.join("smartstore-cli-url-test.txt");
        std::fs::write(
            &path,
            "# batch for 2026-08\nhttps://smartstore.naver.com/a/products/1\n\n  https://smartstore.naver.com/b/products/2  \n",
        )
        .unwrap();
        let urls = read_url_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(urls.len(), 2);
        assert!(urls[1].ends_with("/b/products/2"));
    }

    #[test]
    fn cli_overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "smartstore-cli",
            "--max-retries",
            "9",
            "--no-specs",
            "scrape",
            "https://smartstore.naver.com/a/products/1",
        ]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.max_retries, 9);
        assert!(!config.extract_specifications);
    }
}
