use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use linkdive::{CrawlResult, Crawler, CrawlerConfig, HttpFetcher};

/// Depth-limited concurrent web crawler
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URL to start crawling from
    #[arg(required = true)]
    pub url: String,

    /// How many link hops to follow (1 = only the seed page)
    #[arg(short, long, default_value_t = 1)]
    pub depth: usize,

    /// Number of download worker threads
    #[arg(long)]
    pub downloaders: Option<usize>,

    /// Number of link-extraction worker threads
    #[arg(long)]
    pub extractors: Option<usize>,

    /// Maximum simultaneous downloads per host
    #[arg(long)]
    pub per_host: Option<usize>,

    /// Configuration profile (YAML) to load
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Emit the result as JSON instead of a plain listing
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Run the crawl described by the command line
pub fn process_command(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => CrawlerConfig::load_from_file(path)?,
        None => CrawlerConfig::default(),
    };

    // Command line flags override the profile
    if let Some(n) = cli.downloaders {
        config.downloaders = n;
    }
    if let Some(n) = cli.extractors {
        config.extractors = n;
    }
    if let Some(n) = cli.per_host {
        config.per_host = n;
    }

    let fetcher =
        Arc::new(HttpFetcher::new(&config.http).context("Failed to build HTTP client")?);
    let crawler = Crawler::new(fetcher, &config)?;

    info!("Crawling {} to depth {}", cli.url, cli.depth);
    let result = crawler.run(&cli.url, cli.depth)?;

    if cli.json {
        print_json(&result)?;
    } else {
        print_listing(&result);
    }

    Ok(())
}

fn print_listing(result: &CrawlResult) {
    let mut downloaded: Vec<_> = result.downloaded.iter().collect();
    downloaded.sort();

    println!("Downloaded {} pages:", downloaded.len());
    for url in downloaded {
        println!("  {}", url);
    }

    if !result.errors.is_empty() {
        let mut failed: Vec<_> = result.errors.iter().collect();
        failed.sort_by(|a, b| a.0.cmp(b.0));

        println!("Failed {} pages:", failed.len());
        for (url, error) in failed {
            println!("  {}: {}", url, error);
        }
    }
}

fn print_json(result: &CrawlResult) -> Result<()> {
    let mut downloaded: Vec<_> = result.downloaded.iter().collect();
    downloaded.sort();

    let errors: BTreeMap<&str, String> = result
        .errors
        .iter()
        .map(|(url, error)| (url.as_str(), error.to_string()))
        .collect();

    let report = serde_json::json!({
        "downloaded": downloaded,
        "errors": errors,
        "summary": {
            "downloaded": result.downloaded.len(),
            "failed": result.errors.len(),
        },
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }
}
