use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use funko_sales::{Config, pipeline};

/// Scrapes collectible sale histories and writes a cleaned CSV summary.
///
/// With no arguments the stock run is used: headed browser, both collection
/// phases skipped, only the export from the saved item details.
#[derive(Parser)]
#[command(name = "funko_sales", version)]
struct Cli {
    /// JSON config file; missing keys keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Crawl category listings for item links
    #[arg(long)]
    collect_links: bool,

    /// Extract details for item links not saved yet
    #[arg(long)]
    collect_details: bool,

    /// Use a running WebDriver server instead of spawning chromedriver
    #[arg(long)]
    webdriver_url: Option<String>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "funko_sales=info".into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if cli.headless {
        config.headless = true;
    }
    if cli.collect_links {
        config.skip_item_links = false;
    }
    if cli.collect_details {
        config.skip_item_details = false;
    }
    if cli.webdriver_url.is_some() {
        config.webdriver.url = cli.webdriver_url;
    }

    info!(
        skip_item_links = config.skip_item_links,
        skip_item_details = config.skip_item_details,
        "Starting run"
    );
    let exported = pipeline::run(&config).await.context("scrape run failed")?;
    info!(exported, csv = %config.cleaned_csv_path.display(), "Done");
    Ok(())
}
