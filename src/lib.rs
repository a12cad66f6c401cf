//! Depth-limited concurrent web crawler with per-host admission control.
//!
//! Starting from a seed URL, the crawler fetches pages on a bounded pool
//! of download threads, extracts outgoing links on a separate extraction
//! pool, and recursively follows them up to a hop limit. No URL is
//! fetched twice, no host sees more than a configured number of
//! simultaneous downloads, and every attempted URL is reported as either
//! downloaded or failed with the specific error.
//!
//! ```no_run
//! use std::sync::Arc;
//! use linkdive::{Crawler, CrawlerConfig, HttpFetcher};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = CrawlerConfig::default();
//! let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
//! let crawler = Crawler::new(fetcher, &config)?;
//!
//! let result = crawler.run("https://example.com", 2)?;
//! println!("{} pages downloaded", result.downloaded.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod fetch;

pub use config::{CrawlerConfig, HttpSettings};
pub use crawler::{CrawlResult, Crawler};
pub use error::{Closed, ConfigError, CrawlError, FetchError, HostParseError};
pub use fetch::{Fetcher, HttpFetcher, Page};
