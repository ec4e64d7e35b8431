mod discover;
mod history;
mod render;

use clap::{Parser, Subcommand};
use collab_core::Rating;
use collab_store::Stores;
use tracing_subscriber::EnvFilter;

use crate::history::HistoryCommands;

#[derive(Debug, Parser)]
#[command(name = "collab-cli")]
#[command(about = "Find collaboration partners and products for a brand")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze a brand and recommend collaborators with products
    Discover {
        /// Brand URL or domain (e.g. graza.co)
        url: String,
        /// Ignore any cached result for this domain
        #[arg(long)]
        fresh: bool,
        /// Verify the model's seeded products instead of sourcing from shopping results
        #[arg(long)]
        verify_seeds: bool,
    },
    /// Inspect or edit the recent-search history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Rate the cached recommendations for a domain
    Feedback {
        /// Domain that was searched
        domain: String,
        /// positive or negative
        rating: Rating,
    },
    /// Find a live product page for one product
    Verify {
        /// Product name as a shopper would write it
        product: String,
        /// Brand that makes the product
        #[arg(long)]
        brand: String,
        /// Brand domain; guessed from the brand name when omitted
        #[arg(long)]
        domain: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = collab_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stores = Stores::open(&config.state_dir)?;

    match cli.command {
        Commands::Discover {
            url,
            fresh,
            verify_seeds,
        } => discover::run_discover(&config, &stores, &url, fresh, verify_seeds).await?,
        Commands::History { command } => history::run_history(&stores, &command)?,
        Commands::Feedback { domain, rating } => discover::run_feedback(&stores, &domain, rating)?,
        Commands::Verify {
            product,
            brand,
            domain,
        } => discover::run_verify(&config, &product, &brand, domain.as_deref()).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
