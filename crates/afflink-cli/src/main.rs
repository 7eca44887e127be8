mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "afflink-cli")]
#[command(about = "Amazon affiliate link and product scraping tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the affiliate link for a product URL or ASIN
    Link {
        url: String,
        /// Affiliate tag; defaults to `AFFLINK_AFFILIATE_TAG`
        #[arg(long)]
        tag: Option<String>,
    },
    /// Fetch a product page and print the scraped product as JSON
    Scrape { url: String },
    /// Run the extractor on a saved product page
    Extract {
        file: PathBuf,
        /// ASIN of the page's own product, excluded from recommendations
        #[arg(long)]
        asin: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = afflink_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Link { url, tag } => commands::run_link(&config, &url, tag.as_deref())?,
        Commands::Scrape { url } => commands::run_scrape(&config, &url).await?,
        Commands::Extract { file, asin } => commands::run_extract(&file, asin.as_deref())?,
    }

    Ok(())
}
