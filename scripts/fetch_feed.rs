//! Standalone check for one department feed.
//!
//! Fetches the live gov.uk Atom feed for a department and prints the
//! normalized entries as JSON. Useful for verifying the normalizer against the
//! real upstream without running the API or a cache backend.
//!
//! Run with: cargo run --bin fetch-feed -- <department-id>
//! Examples:
//!   cargo run --bin fetch-feed -- HMT
//!   cargo run --bin fetch-feed -- DEFRA

use std::time::Duration;

use govreader_api::config::Config;
use govreader_api::feed::{normalize, FeedFetcher, HttpFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <department-id>", args[0]);
        std::process::exit(1);
    }

    let config = Config::load()?;
    let catalog = config.catalog()?;

    let Some(department) = catalog.lookup(&args[1].to_uppercase()) else {
        eprintln!("Unknown department '{}'. Known ids:", args[1]);
        for d in catalog.all() {
            eprintln!("  {:<6} {}", d.id, d.name);
        }
        std::process::exit(1);
    };

    let fetcher = HttpFetcher::new(
        &config.feeds.base_url,
        &config.feeds.user_agent,
        Duration::from_secs(config.feeds.fetch_timeout_secs),
    )?;

    eprintln!("Fetching {}...\n", fetcher.feed_url(department));

    let raw = fetcher.fetch(department).await?;
    let feed = normalize(&raw)?;

    println!("{}", serde_json::to_string_pretty(&feed)?);
    eprintln!("\n{} entries", feed.len());

    Ok(())
}
