use thiserror::Error;

/// Rejected crawler configuration, reported before any crawling starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("downloaders must be at least 1 (got {0})")]
    Downloaders(usize),

    #[error("extractors must be at least 1 (got {0})")]
    Extractors(usize),

    #[error("per_host must be at least 1 (got {0})")]
    PerHost(usize),
}

/// The URL's authority component could not be determined.
#[derive(Debug, Error)]
pub enum HostParseError {
    #[error("malformed url: {0}")]
    Malformed(#[from] url::ParseError),

    #[error("url has no host component")]
    MissingHost,
}

/// Failure to retrieve a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(reqwest::StatusCode),

    #[error("{0}")]
    Other(String),
}

/// Why a URL ended up in `errors` instead of `downloaded`.
///
/// Exactly one entry exists per failed URL; failures never propagate out
/// of the crawl as panics or early returns.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("cannot determine host: {0}")]
    HostParse(#[from] HostParseError),

    #[error("download failed: {0}")]
    Transport(#[from] FetchError),
}

/// The crawler has been shut down; no further crawls are accepted.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("crawler has been shut down")]
pub struct Closed;
